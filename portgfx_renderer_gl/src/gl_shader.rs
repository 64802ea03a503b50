/// Shader path - stock GLSL programs realizing the preset palette
///
/// Every preset has an untextured and a single-texture variant. Programs are
/// compiled once at startup and looked up by `StockShader`; a program that
/// fails to compile is simply absent and the renderer falls back to the
/// combiner path for it.

use slotmap::{new_key_type, SlotMap};
use rustc_hash::FxHashMap;
use portgfx::portgfx::graphics::{
    PresetProgramDesc, TexturePreset, VertexDefinition, VertexElementKind, MAX_TEXTURE_STAGES,
};
use portgfx::portgfx::Result;
use portgfx::{engine_bail, engine_debug, engine_err, engine_warn};
use crate::gl_api::*;
use crate::gl_debug::clear_errors;
use crate::gl_render_state::{alpha_func_to_gl, component_type_to_gl, element_pointer, TextureStages};
use crate::gl_texture::TextureManager;

new_key_type! {
    /// Key of a linked shader program
    pub struct ShaderProgramId;
}

// ===== STOCK SOURCES =====

macro_rules! fragment_source {
    ($($line:expr),* $(,)?) => {
        concat!("#ifdef GL_ES\n", "precision mediump float;\n", "#endif\n", $($line, "\n"),*)
    };
}

const VERTEX_NOCOLOR_TEX1: &str = "\
attribute vec4 position;
attribute vec2 texcoord;
uniform mat4 modelView;
uniform mat4 projection;
varying vec2 outTexcoord;
void main() {
    gl_Position = projection * (modelView * position);
    outTexcoord = texcoord;
}
";

const VERTEX_COLOR_NOTEX: &str = "\
attribute vec4 position;
attribute vec4 color;
uniform mat4 modelView;
uniform mat4 projection;
varying vec4 outColor;
void main() {
    gl_Position = projection * (modelView * position);
    outColor = color;
}
";

const VERTEX_COLOR_TEX1: &str = "\
attribute vec4 position;
attribute vec2 texcoord;
attribute vec4 color;
uniform mat4 modelView;
uniform mat4 projection;
varying vec2 outTexcoord;
varying vec4 outColor;
void main() {
    gl_Position = projection * (modelView * position);
    outColor = color;
    outTexcoord = texcoord;
}
";

/// One of the built-in programs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StockShader {
    BasicNocolorTex1,
    BasicColorNotex,
    BasicColorTex1,
    MulAlphaColorNotex,
    MulAlphaColorTex1,
    InvertColorNotex,
    InvertColorTex1,
    X4ColorNotex,
    X4ColorTex1,
    PmaColorNotex,
    PmaColorTex1,
    PmaInvertColorNotex,
    PmaInvertColorTex1,
    PmaX4ColorNotex,
    PmaX4ColorTex1,
}

impl StockShader {
    pub const ALL: [StockShader; 15] = [
        StockShader::BasicNocolorTex1,
        StockShader::BasicColorNotex,
        StockShader::BasicColorTex1,
        StockShader::MulAlphaColorNotex,
        StockShader::MulAlphaColorTex1,
        StockShader::InvertColorNotex,
        StockShader::InvertColorTex1,
        StockShader::X4ColorNotex,
        StockShader::X4ColorTex1,
        StockShader::PmaColorNotex,
        StockShader::PmaColorTex1,
        StockShader::PmaInvertColorNotex,
        StockShader::PmaInvertColorTex1,
        StockShader::PmaX4ColorNotex,
        StockShader::PmaX4ColorTex1,
    ];

    /// Program realizing `preset`, with or without a texture
    pub fn for_preset(preset: TexturePreset, textured: bool) -> StockShader {
        match (preset, textured) {
            (TexturePreset::Modulate, false) => StockShader::BasicColorNotex,
            (TexturePreset::Modulate, true) => StockShader::BasicColorTex1,
            (TexturePreset::MulAlpha, false) => StockShader::MulAlphaColorNotex,
            (TexturePreset::MulAlpha, true) => StockShader::MulAlphaColorTex1,
            (TexturePreset::Invert, false) => StockShader::InvertColorNotex,
            (TexturePreset::Invert, true) => StockShader::InvertColorTex1,
            (TexturePreset::X4, false) => StockShader::X4ColorNotex,
            (TexturePreset::X4, true) => StockShader::X4ColorTex1,
            (TexturePreset::Pma, false) => StockShader::PmaColorNotex,
            (TexturePreset::Pma, true) => StockShader::PmaColorTex1,
            (TexturePreset::PmaInvert, false) => StockShader::PmaInvertColorNotex,
            (TexturePreset::PmaInvert, true) => StockShader::PmaInvertColorTex1,
            (TexturePreset::PmaX4, false) => StockShader::PmaX4ColorNotex,
            (TexturePreset::PmaX4, true) => StockShader::PmaX4ColorTex1,
        }
    }

    /// (vertex, fragment) GLSL sources
    pub fn sources(self) -> (&'static str, &'static str) {
        match self {
            StockShader::BasicNocolorTex1 => (
                VERTEX_NOCOLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "void main() {",
                    "    gl_FragColor = texture2D(texture0, outTexcoord);",
                    "}",
                ),
            ),
            StockShader::BasicColorNotex => (
                VERTEX_COLOR_NOTEX,
                fragment_source!(
                    "varying vec4 outColor;",
                    "void main() {",
                    "    gl_FragColor = outColor;",
                    "}",
                ),
            ),
            StockShader::BasicColorTex1 => (
                VERTEX_COLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "varying vec4 outColor;",
                    "void main() {",
                    "    gl_FragColor = texture2D(texture0, outTexcoord) * outColor;",
                    "}",
                ),
            ),
            StockShader::MulAlphaColorNotex => (
                VERTEX_COLOR_NOTEX,
                fragment_source!(
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 c = outColor;",
                    "    gl_FragColor = vec4(c.rgb * c.a, c.a);",
                    "}",
                ),
            ),
            StockShader::MulAlphaColorTex1 => (
                VERTEX_COLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 c = texture2D(texture0, outTexcoord) * outColor;",
                    "    gl_FragColor = vec4(c.rgb * c.a, c.a);",
                    "}",
                ),
            ),
            StockShader::InvertColorNotex => (
                VERTEX_COLOR_NOTEX,
                fragment_source!(
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 c = outColor;",
                    "    gl_FragColor = vec4(1.0 - c.rgb, c.a);",
                    "}",
                ),
            ),
            StockShader::InvertColorTex1 => (
                VERTEX_COLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 c = texture2D(texture0, outTexcoord);",
                    "    gl_FragColor = vec4((1.0 - c.rgb) * (1.0 - outColor.rgb), c.a * outColor.a);",
                    "}",
                ),
            ),
            StockShader::X4ColorNotex => (
                VERTEX_COLOR_NOTEX,
                fragment_source!(
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 c = outColor;",
                    "    gl_FragColor = vec4(c.rgb * 4.0, c.a);",
                    "}",
                ),
            ),
            StockShader::X4ColorTex1 => (
                VERTEX_COLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 c = texture2D(texture0, outTexcoord) * outColor;",
                    "    gl_FragColor = vec4(c.rgb * 4.0, c.a);",
                    "}",
                ),
            ),
            StockShader::PmaColorNotex => (
                VERTEX_COLOR_NOTEX,
                fragment_source!(
                    "varying vec4 outColor;",
                    "void main() {",
                    "    gl_FragColor = vec4(outColor.rgb * outColor.a, outColor.a);",
                    "}",
                ),
            ),
            StockShader::PmaColorTex1 => (
                VERTEX_COLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 oc = vec4(outColor.rgb * outColor.a, outColor.a);",
                    "    gl_FragColor = texture2D(texture0, outTexcoord) * oc;",
                    "}",
                ),
            ),
            StockShader::PmaInvertColorNotex => (
                VERTEX_COLOR_NOTEX,
                fragment_source!(
                    "varying vec4 outColor;",
                    "void main() {",
                    "    gl_FragColor = vec4((1.0 - outColor.rgb) * outColor.a, outColor.a);",
                    "}",
                ),
            ),
            StockShader::PmaInvertColorTex1 => (
                VERTEX_COLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 c = texture2D(texture0, outTexcoord);",
                    "    gl_FragColor = vec4(outColor.rgb * (1.0 - c.rgb), c.a * outColor.a);",
                    "}",
                ),
            ),
            StockShader::PmaX4ColorNotex => (
                VERTEX_COLOR_NOTEX,
                fragment_source!(
                    "varying vec4 outColor;",
                    "void main() {",
                    "    gl_FragColor = vec4(outColor.rgb * outColor.a * 4.0, outColor.a);",
                    "}",
                ),
            ),
            StockShader::PmaX4ColorTex1 => (
                VERTEX_COLOR_TEX1,
                fragment_source!(
                    "uniform sampler2D texture0;",
                    "varying vec2 outTexcoord;",
                    "varying vec4 outColor;",
                    "void main() {",
                    "    vec4 oc = vec4(outColor.rgb * outColor.a * 4.0, outColor.a);",
                    "    gl_FragColor = texture2D(texture0, outTexcoord) * oc;",
                    "}",
                ),
            ),
        }
    }
}

const SAMPLER_NAMES: [&str; MAX_TEXTURE_STAGES] = ["texture0", "texture1", "texture2", "texture3"];
const TEXCOORD_NAMES: [&str; MAX_TEXTURE_STAGES] = ["texcoord", "texcoord2", "texcoord3", "texcoord4"];

// ===== PROGRAMS =====

/// A linked program and its queried locations (-1 when absent)
#[derive(Debug, Clone)]
pub(crate) struct ShaderProgram {
    pub program: GLuint,
    vertex_shader: GLuint,
    fragment_shader: GLuint,
    pub projection: GLint,
    pub model_view: GLint,
    pub position: GLint,
    pub samplers: [GLint; MAX_TEXTURE_STAGES],
    pub texcoords: [GLint; MAX_TEXTURE_STAGES],
    pub color: GLint,
}

impl ShaderProgram {
    fn query(gl: &mut dyn GlApi, program: GLuint, vertex_shader: GLuint, fragment_shader: GLuint) -> Self {
        Self {
            program,
            vertex_shader,
            fragment_shader,
            projection: gl.get_uniform_location(program, "projection"),
            model_view: gl.get_uniform_location(program, "modelView"),
            position: gl.get_attrib_location(program, "position"),
            samplers: SAMPLER_NAMES.map(|name| gl.get_uniform_location(program, name)),
            texcoords: TEXCOORD_NAMES.map(|name| gl.get_attrib_location(program, name)),
            color: gl.get_attrib_location(program, "color"),
        }
    }

    /// Generic attribute index for `kind`, `None` when the program lacks it
    fn attribute(&self, kind: VertexElementKind) -> Option<GLuint> {
        let location = match kind {
            VertexElementKind::Position => self.position,
            VertexElementKind::Color => self.color,
            kind => self.texcoords[kind.texcoord_slot().unwrap_or(0)],
        };
        (location >= 0).then_some(location as GLuint)
    }
}

/// Compiles one shader stage; the shader name is returned even on failure so
/// the caller can delete it
fn compile_stage(gl: &mut dyn GlApi, ty: GLenum, source: &str) -> (GLuint, bool) {
    let shader = gl.create_shader(ty);
    if shader == 0 {
        return (0, false);
    }
    gl.shader_source(shader, source);
    gl.compile_shader(shader);
    let compiled = gl.get_shader_i(shader, GL_COMPILE_STATUS) == GL_TRUE;
    (shader, compiled && gl.get_error() == GL_NO_ERROR)
}

/// Compile both stages into `program` and link it; created shader names are
/// written to `shaders` as they appear
fn link_program(gl: &mut dyn GlApi, program: GLuint, sources: [&str; 2], shaders: &mut [GLuint; 2]) -> bool {
    for (slot, (ty, source)) in [GL_VERTEX_SHADER, GL_FRAGMENT_SHADER].into_iter().zip(sources).enumerate() {
        let (shader, compiled) = compile_stage(gl, ty, source);
        shaders[slot] = shader;
        if !compiled {
            return false;
        }
        gl.attach_shader(program, shader);
    }
    gl.link_program(program);
    gl.get_error() == GL_NO_ERROR
}

// ===== ENGINE =====

/// Stock shader programs plus the state of the one in use
pub(crate) struct ShaderEngine {
    programs: SlotMap<ShaderProgramId, ShaderProgram>,
    stock: FxHashMap<StockShader, ShaderProgramId>,
    active: Option<ShaderProgramId>,
    /// `glAlphaFunc` is still available alongside programs (desktop only)
    fixed_alpha_test: bool,
}

impl ShaderEngine {
    pub fn new(fixed_alpha_test: bool) -> Self {
        Self {
            programs: SlotMap::with_key(),
            stock: FxHashMap::default(),
            active: None,
            fixed_alpha_test,
        }
    }

    /// Compile every stock program, logging the ones that fail
    pub fn compile_stock(&mut self, gl: &mut dyn GlApi) {
        for shader in StockShader::ALL {
            let (vertex, fragment) = shader.sources();
            match self.compile(gl, vertex, fragment) {
                Ok(id) => {
                    self.stock.insert(shader, id);
                }
                Err(_) => {
                    engine_warn!("portgfx::gl::Shader", "stock program {:?} unavailable", shader);
                }
            }
        }
        engine_debug!(
            "portgfx::gl::Shader",
            "{} of {} stock programs compiled",
            self.stock.len(),
            StockShader::ALL.len()
        );
    }

    /// Compile and link a program from GLSL sources
    pub fn compile(&mut self, gl: &mut dyn GlApi, vertex_source: &str, fragment_source: &str) -> Result<ShaderProgramId> {
        clear_errors(gl);

        let program = gl.create_program();
        let mut shaders = [0; 2];
        let linked = program != 0
            && gl.get_error() == GL_NO_ERROR
            && link_program(gl, program, [vertex_source, fragment_source], &mut shaders);

        if !linked {
            for shader in shaders {
                if shader != 0 {
                    gl.delete_shader(shader);
                }
            }
            if program != 0 {
                gl.delete_program(program);
            }
            engine_bail!("portgfx::gl::Shader", "shader program failed to compile or link");
        }

        let info = ShaderProgram::query(gl, program, shaders[0], shaders[1]);
        Ok(self.programs.insert(info))
    }

    /// Delete a program and its shaders
    pub fn delete(&mut self, gl: &mut dyn GlApi, id: ShaderProgramId) {
        let Some(info) = self.programs.remove(id) else {
            return;
        };
        if self.active == Some(id) {
            gl.use_program(0);
            self.active = None;
        }
        for shader in [info.vertex_shader, info.fragment_shader] {
            if shader != 0 {
                gl.delete_shader(shader);
            }
        }
        gl.delete_program(info.program);
        self.stock.retain(|_, v| *v != id);
    }

    #[cfg(test)]
    pub fn program(&self, id: ShaderProgramId) -> Option<&ShaderProgram> {
        self.programs.get(id)
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    pub fn stock(&self, shader: StockShader) -> Option<ShaderProgramId> {
        self.stock.get(&shader).copied()
    }

    /// Program for `desc`, if its stock variant compiled
    pub fn program_for(&self, desc: &PresetProgramDesc) -> Option<ShaderProgramId> {
        self.stock(StockShader::for_preset(desc.preset, desc.texture.is_some()))
    }

    #[cfg(test)]
    pub fn active(&self) -> Option<ShaderProgramId> {
        self.active
    }

    /// Use the preset's program, upload matrices and bind the texture to stage 0
    pub fn apply(
        &mut self,
        gl: &mut dyn GlApi,
        textures: &mut TextureManager,
        stages: &mut TextureStages,
        desc: &PresetProgramDesc,
    ) -> Result<()> {
        if let Some(id) = desc.texture {
            if textures.get(id).is_none() {
                return Err(engine_err!("portgfx::gl::Shader", InvalidHandle => "unknown texture {:?}", id));
            }
        }
        let Some(id) = self.program_for(desc) else {
            engine_bail!("portgfx::gl::Shader", CapabilityUnsupported => "no program for preset {:?}", desc.preset);
        };
        let Some(info) = self.programs.get(id) else {
            engine_bail!("portgfx::gl::Shader", InvalidHandle => "stale program for preset {:?}", desc.preset);
        };

        gl.use_program(info.program);
        gl.uniform_matrix_4fv(info.projection, &desc.projection.to_cols_array());
        gl.uniform_matrix_4fv(info.model_view, &desc.view.to_cols_array());
        if info.samplers[0] >= 0 {
            gl.uniform_1i(info.samplers[0], 0);
        }

        match (desc.alpha_test, self.fixed_alpha_test) {
            (Some(test), true) => {
                gl.enable(GL_ALPHA_TEST);
                gl.alpha_func(alpha_func_to_gl(test.func), test.reference);
            }
            (None, true) => gl.disable(GL_ALPHA_TEST),
            (Some(_), false) => {
                engine_debug!("portgfx::gl::Shader", "alpha test ignored without fixed-function support");
            }
            (None, false) => {}
        }

        stages.set(gl, textures, 0, desc.texture, desc.draw_mode)?;
        self.active = Some(id);
        Ok(())
    }

    /// Stop using any program and unbind textures
    pub fn clear(&mut self, gl: &mut dyn GlApi, textures: &TextureManager, stages: &mut TextureStages) {
        gl.use_program(0);
        if self.fixed_alpha_test {
            gl.disable(GL_ALPHA_TEST);
        }
        stages.clear(gl, textures);
        self.active = None;
    }

    /// Delete every program
    pub fn cleanup(&mut self, gl: &mut dyn GlApi) {
        let ids: Vec<ShaderProgramId> = self.programs.keys().collect();
        for id in ids {
            self.delete(gl, id);
        }
        self.stock.clear();
    }

    // ===== VERTEX ATTRIBUTES =====

    /// Point the active program's attributes at `definition`'s elements
    ///
    /// `vertices` is `None` when the data lives in the bound array buffer.
    ///
    /// # Safety
    ///
    /// Client vertex bytes must outlive the following draw call.
    pub unsafe fn bind_attributes(&self, gl: &mut dyn GlApi, definition: &VertexDefinition, vertices: Option<&[u8]>) {
        let Some(info) = self.active.and_then(|id| self.programs.get(id)) else {
            return;
        };
        let stride = definition.stride as GLsizei;
        for element in &definition.elements {
            let Some(index) = info.attribute(element.kind) else {
                continue;
            };
            let normalized = element.kind == VertexElementKind::Color;
            gl.vertex_attrib_pointer(
                index,
                element.components as GLint,
                component_type_to_gl(element.component_type),
                normalized,
                stride,
                element_pointer(vertices, element),
            );
            if let Some(slot) = element.kind.texcoord_slot() {
                if info.samplers[slot] >= 0 {
                    gl.uniform_1i(info.samplers[slot], slot as GLint);
                }
            }
            gl.enable_vertex_attrib_array(index);
        }
    }

    /// Disable the attribute arrays enabled by [`ShaderEngine::bind_attributes`]
    pub fn unbind_attributes(&self, gl: &mut dyn GlApi, definition: &VertexDefinition) {
        let Some(info) = self.active.and_then(|id| self.programs.get(id)) else {
            return;
        };
        for element in &definition.elements {
            if let Some(index) = info.attribute(element.kind) {
                gl.disable_vertex_attrib_array(index);
            }
        }
    }
}

#[cfg(test)]
#[path = "gl_shader_tests.rs"]
mod tests;
