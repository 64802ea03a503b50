//! Unit tests for render state mapping and texture stages

use crate::gl_api::*;
use crate::gl_context::GlProfile;
use crate::gl_render_state::*;
use crate::gl_texture::TextureManager;
use crate::mock_gl::MockGl;
use portgfx::portgfx::graphics::{
    BlendEquation, BlendFactor, Bounds, ClearFlags, DepthFunc, DrawMode, PrimitiveType,
};
use portgfx::portgfx::Error;

// ============================================================================
// Blending / scissor / clear
// ============================================================================

#[test]
fn test_blend_disable_equation_turns_blending_off() {
    let mut gl = MockGl::desktop();
    set_blend_mode(&mut gl, BlendEquation::Add, BlendFactor::SrcAlpha, BlendFactor::OneMinusSrcAlpha);
    assert!(gl.state().is_enabled(GL_BLEND));

    gl.clear_calls();
    set_blend_mode(&mut gl, BlendEquation::Disable, BlendFactor::One, BlendFactor::One);

    assert!(!gl.state().is_enabled(GL_BLEND));
    assert_eq!(gl.count_calls("glBlendFunc"), 0);
}

#[test]
fn test_blend_mode_maps_factors_and_equation() {
    let mut gl = MockGl::desktop();
    set_blend_mode(&mut gl, BlendEquation::ReverseSubtract, BlendFactor::DstColor, BlendFactor::Zero);

    let state = gl.state();
    assert_eq!(state.blend_func, Some((GL_DST_COLOR, GL_ZERO, GL_DST_COLOR, GL_ZERO)));
    assert_eq!(state.blend_equation, Some(GL_FUNC_REVERSE_SUBTRACT));
}

#[test]
fn test_blend_mode_separate() {
    let mut gl = MockGl::desktop();
    set_blend_mode_separate(
        &mut gl,
        BlendEquation::Add,
        BlendFactor::SrcAlpha,
        BlendFactor::OneMinusSrcAlpha,
        BlendFactor::One,
        BlendFactor::OneMinusDstAlpha,
    );

    let state = gl.state();
    assert_eq!(
        state.blend_func,
        Some((GL_SRC_ALPHA, GL_ONE_MINUS_SRC_ALPHA, GL_ONE, GL_ONE_MINUS_DST_ALPHA))
    );
    assert!(state.is_enabled(GL_BLEND));
}

#[test]
fn test_scissor_bounds_converted_to_rect() {
    let mut gl = MockGl::desktop();

    set_scissor_bounds(&mut gl, Some(Bounds::new(10, 20, 110, 70)));
    assert_eq!(gl.state().scissor, Some([10, 20, 100, 50]));
    assert!(gl.state().is_enabled(GL_SCISSOR_TEST));

    set_scissor_bounds(&mut gl, None);
    assert!(!gl.state().is_enabled(GL_SCISSOR_TEST));
}

#[test]
fn test_clear_resets_depth_func() {
    let mut gl = MockGl::desktop();
    gl.depth_func(depth_func_to_gl(DepthFunc::Greater));

    clear(&mut gl, ClearFlags::COLOR | ClearFlags::DEPTH);

    assert!(gl.has_call("glClear(0x4100)"));
    assert_eq!(gl.state().depth_func, Some(GL_LEQUAL));
}

#[test]
fn test_enum_mapping() {
    assert_eq!(depth_func_to_gl(DepthFunc::Never), GL_NEVER);
    assert_eq!(depth_func_to_gl(DepthFunc::Always), GL_ALWAYS);
    assert_eq!(primitive_to_gl(PrimitiveType::TriangleFan), GL_TRIANGLE_FAN);
    assert_eq!(primitive_to_gl(PrimitiveType::Points), GL_POINTS);
    assert_eq!(blend_equation_to_gl(BlendEquation::Disable), None);
}

// ============================================================================
// Texture stages
// ============================================================================

fn setup() -> (MockGl, TextureManager, TextureStages) {
    let gl = MockGl::desktop();
    let textures = TextureManager::new(gl.capabilities(), GlProfile::Desktop);
    (gl, textures, TextureStages::new())
}

#[test]
fn test_set_stage_binds_on_unit() {
    let (mut gl, mut textures, mut stages) = setup();
    let id = textures.create(&mut gl, 8, 8, false).unwrap();

    stages.set(&mut gl, &mut textures, 2, Some(id), DrawMode::Nearest).unwrap();

    let native = textures.get(id).unwrap().native;
    let state = gl.state();
    assert_eq!(state.texture_bound_to(2, GL_TEXTURE_2D), Some(native));
    assert!(state.is_texture_enabled(2, GL_TEXTURE_2D));
    drop(state);
    assert_eq!(stages.count(), 3);
}

#[test]
fn test_set_stage_rejects_out_of_range_and_stale() {
    let (mut gl, mut textures, mut stages) = setup();
    let id = textures.create(&mut gl, 8, 8, false).unwrap();

    let result = stages.set(&mut gl, &mut textures, 4, Some(id), DrawMode::Nearest);
    assert!(matches!(result, Err(Error::BackendError(_))));

    textures.release(&mut gl, id).unwrap();
    gl.clear_calls();
    let result = stages.set(&mut gl, &mut textures, 0, Some(id), DrawMode::Nearest);
    assert!(matches!(result, Err(Error::InvalidHandle(_))));
    assert!(gl.calls().is_empty());
}

#[test]
fn test_clear_unbinds_used_stages_only() {
    let (mut gl, mut textures, mut stages) = setup();
    let a = textures.create(&mut gl, 8, 8, false).unwrap();
    let b = textures.create(&mut gl, 8, 8, false).unwrap();
    stages.set(&mut gl, &mut textures, 0, Some(a), DrawMode::Nearest).unwrap();
    stages.set(&mut gl, &mut textures, 1, Some(b), DrawMode::Bilinear).unwrap();
    gl.clear_calls();

    stages.clear(&mut gl, &textures);

    assert_eq!(gl.count_calls("glActiveTexture"), 3);
    let state = gl.state();
    assert!(!state.is_texture_enabled(0, GL_TEXTURE_2D));
    assert!(!state.is_texture_enabled(1, GL_TEXTURE_2D));
    assert_eq!(state.active_unit, 0);
    drop(state);
    assert_eq!(stages.count(), 0);
    assert_eq!(stages.bound(1), None);
}

#[test]
fn test_unbind_texture_keeps_active_stage() {
    let (mut gl, mut textures, mut stages) = setup();
    let a = textures.create(&mut gl, 8, 8, false).unwrap();
    let b = textures.create(&mut gl, 8, 8, false).unwrap();
    stages.set(&mut gl, &mut textures, 0, Some(a), DrawMode::Nearest).unwrap();
    stages.set(&mut gl, &mut textures, 1, Some(b), DrawMode::Nearest).unwrap();

    stages.unbind_texture(&mut gl, &textures, a);

    let state = gl.state();
    assert!(!state.is_texture_enabled(0, GL_TEXTURE_2D));
    assert!(state.is_texture_enabled(1, GL_TEXTURE_2D));
    assert_eq!(state.active_unit, 1);
    drop(state);
    assert_eq!(stages.bound(0), None);
    assert_eq!(stages.bound(1), Some(b));
}
