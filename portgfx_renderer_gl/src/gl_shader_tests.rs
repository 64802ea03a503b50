//! Unit tests for the stock shader programs

use crate::gl_api::*;
use crate::gl_context::GlProfile;
use crate::gl_render_state::TextureStages;
use crate::gl_shader::*;
use crate::gl_texture::TextureManager;
use crate::mock_gl::MockGl;
use glam::Mat4;
use portgfx::portgfx::graphics::{
    AlphaTestFunc, ColorVertex, DrawMode, PresetProgramDesc, TexturePreset, TexturedVertex,
};
use portgfx::portgfx::Error;

fn setup(gl: MockGl, profile: GlProfile) -> (MockGl, TextureManager, TextureStages, ShaderEngine) {
    let mut gl = gl;
    let textures = TextureManager::new(gl.capabilities(), profile);
    let mut engine = ShaderEngine::new(profile == GlProfile::Desktop);
    engine.compile_stock(&mut gl);
    (gl, textures, TextureStages::new(), engine)
}

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_every_stock_program_compiles() {
    let (_gl, _textures, _stages, engine) = setup(MockGl::es2(), GlProfile::Es2);
    for shader in StockShader::ALL {
        assert!(engine.stock(shader).is_some(), "{:?} missing", shader);
    }
}

#[test]
fn test_fragment_sources_guard_precision() {
    for shader in StockShader::ALL {
        let (_, fragment) = shader.sources();
        assert!(fragment.starts_with("#ifdef GL_ES\nprecision mediump float;\n#endif\n"));
    }
}

#[test]
fn test_compile_failure_deletes_objects() {
    let mut gl = MockGl::es2();
    gl.set_compile_failures(true);
    let mut engine = ShaderEngine::new(false);

    let result = engine.compile(&mut gl, "void main() {}", "void main() {}");

    assert!(matches!(result, Err(Error::BackendError(_))));
    let state = gl.state();
    assert!(state.programs.is_empty());
    assert!(state.shaders.is_empty());
}

#[test]
fn test_failed_stock_programs_are_absent() {
    let mut gl = MockGl::es2();
    gl.set_compile_failures(true);
    let mut engine = ShaderEngine::new(false);
    engine.compile_stock(&mut gl);

    let desc = PresetProgramDesc::new(TexturePreset::Pma);
    assert!(engine.program_for(&desc).is_none());
}

#[test]
fn test_locations_follow_declarations() {
    let (_gl, _textures, _stages, engine) = setup(MockGl::es2(), GlProfile::Es2);
    let id = engine.stock(StockShader::BasicColorTex1).unwrap();
    let program = engine.program(id).unwrap();

    // Attribute location 0 is a valid location
    assert_eq!(program.position, 0);
    assert_eq!(program.texcoords[0], 1);
    assert_eq!(program.color, 2);
    assert_eq!(program.texcoords[1], -1);
    assert!(program.samplers[0] >= 0);
}

// ============================================================================
// Presets
// ============================================================================

#[test]
fn test_textured_preset_selects_textured_program() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);
    let tex = textures.create(&mut gl, 32, 32, true).unwrap();
    let desc = PresetProgramDesc::new(TexturePreset::PmaX4).with_texture(tex, DrawMode::Bilinear);

    engine.apply(&mut gl, &mut textures, &mut stages, &desc).unwrap();

    let expected = engine.stock(StockShader::PmaX4ColorTex1).unwrap();
    assert_eq!(engine.active(), Some(expected));
    let native = textures.get(tex).unwrap().native;
    let program = engine.program(expected).unwrap().program;
    let state = gl.state();
    assert_eq!(state.current_program, program);
    assert_eq!(state.texture_bound_to(0, GL_TEXTURE_2D), Some(native));
}

#[test]
fn test_untextured_preset_selects_notex_program() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);

    engine
        .apply(&mut gl, &mut textures, &mut stages, &PresetProgramDesc::new(TexturePreset::Invert))
        .unwrap();

    assert_eq!(engine.active(), engine.stock(StockShader::InvertColorNotex));
}

#[test]
fn test_matrices_uploaded_to_uniforms() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);
    let projection = Mat4::orthographic_rh_gl(0.0, 320.0, 240.0, 0.0, -1.0, 1.0);
    let view = Mat4::from_scale(glam::Vec3::splat(2.0));
    let desc = PresetProgramDesc::new(TexturePreset::Modulate).with_matrices(projection, view);

    engine.apply(&mut gl, &mut textures, &mut stages, &desc).unwrap();

    let info = engine.program(engine.active().unwrap()).unwrap().clone();
    let state = gl.state();
    assert_eq!(state.uniform_matrices[&(info.program, info.projection)], projection.to_cols_array());
    assert_eq!(state.uniform_matrices[&(info.program, info.model_view)], view.to_cols_array());
}

#[test]
fn test_alpha_test_uses_fixed_function_on_desktop_only() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::desktop(), GlProfile::Desktop);
    let desc = PresetProgramDesc::new(TexturePreset::Modulate).with_alpha_test(AlphaTestFunc::GreaterEqual, 0.25);
    engine.apply(&mut gl, &mut textures, &mut stages, &desc).unwrap();
    assert!(gl.state().is_enabled(GL_ALPHA_TEST));

    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);
    engine.apply(&mut gl, &mut textures, &mut stages, &desc).unwrap();
    assert_eq!(gl.count_calls("glAlphaFunc"), 0);
    assert!(gl.state().errors.is_empty());
}

#[test]
fn test_stale_texture_rejected() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);
    let tex = textures.create(&mut gl, 8, 8, false).unwrap();
    textures.release(&mut gl, tex).unwrap();

    let desc = PresetProgramDesc::new(TexturePreset::Modulate).with_texture(tex, DrawMode::Nearest);
    let result = engine.apply(&mut gl, &mut textures, &mut stages, &desc);

    assert!(matches!(result, Err(Error::InvalidHandle(_))));
    assert_eq!(engine.active(), None);
}

#[test]
fn test_clear_stops_using_program() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);
    let tex = textures.create(&mut gl, 8, 8, false).unwrap();
    let desc = PresetProgramDesc::new(TexturePreset::Modulate).with_texture(tex, DrawMode::Nearest);
    engine.apply(&mut gl, &mut textures, &mut stages, &desc).unwrap();

    engine.clear(&mut gl, &textures, &mut stages);

    assert_eq!(gl.state().current_program, 0);
    assert_eq!(engine.active(), None);
    assert_eq!(stages.bound(0), None);
}

// ============================================================================
// Attributes
// ============================================================================

#[test]
fn test_attributes_bound_with_normalized_color() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);
    let tex = textures.create(&mut gl, 8, 8, false).unwrap();
    let desc = PresetProgramDesc::new(TexturePreset::Modulate).with_texture(tex, DrawMode::Nearest);
    engine.apply(&mut gl, &mut textures, &mut stages, &desc).unwrap();
    let definition = TexturedVertex::definition();
    gl.clear_calls();

    unsafe { engine.bind_attributes(&mut gl, &definition, None) };

    assert!(gl.has_call("glVertexAttribPointer(0, 3, 0x1406, false, 24, offset 0)"));
    assert!(gl.has_call("glVertexAttribPointer(2, 4, 0x1401, true, 24, offset 12)"));
    assert!(gl.has_call("glVertexAttribPointer(1, 2, 0x1406, false, 24, offset 16)"));
    assert_eq!(gl.state().attrib_arrays.len(), 3);

    engine.unbind_attributes(&mut gl, &definition);
    assert!(gl.state().attrib_arrays.is_empty());
}

#[test]
fn test_missing_attribute_is_skipped() {
    let (mut gl, mut textures, mut stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);
    engine
        .apply(&mut gl, &mut textures, &mut stages, &PresetProgramDesc::new(TexturePreset::Modulate))
        .unwrap();

    // The untextured program has no texcoord attribute
    unsafe { engine.bind_attributes(&mut gl, &TexturedVertex::definition(), None) };
    assert_eq!(gl.state().attrib_arrays.len(), 2);

    engine.unbind_attributes(&mut gl, &ColorVertex::definition());
    assert!(gl.state().attrib_arrays.is_empty());
}

#[test]
fn test_cleanup_deletes_all_programs() {
    let (mut gl, _textures, _stages, mut engine) = setup(MockGl::es2(), GlProfile::Es2);

    engine.cleanup(&mut gl);

    assert!(gl.state().programs.is_empty());
    assert!(gl.state().shaders.is_empty());
    assert!(engine.stock(StockShader::BasicColorNotex).is_none());
}
