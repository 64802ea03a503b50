/// Fixed-function path - texture-combiner presets and client-array vertex binding
///
/// Each preset is a declarative list of `glTexEnvi` settings. Presets whose
/// math reads the texture operand even when drawing untextured get a 1x1
/// white pixel texture substituted; presets that premultiply the vertex
/// color in a first stage push the caller's texture to stage 1, where a
/// generic "previous times texture" combiner finishes the job.

use portgfx::portgfx::graphics::{
    PresetProgramDesc, Surface, PixelFormat, TextureId, TexturePreset, VertexDefinition,
    VertexElementKind, MAX_TEXTURE_STAGES,
};
use portgfx::portgfx::Result;
use portgfx::{engine_debug, engine_err};
use crate::gl_api::*;
use crate::gl_render_state::{alpha_func_to_gl, component_type_to_gl, element_pointer, TextureStages};
use crate::gl_texture::TextureManager;

/// One `glTexEnvi(GL_TEXTURE_ENV, pname, value)` call
type TexEnvSetting = (GLenum, GLint);

// ===== COMBINER TABLES =====

/// Combiner setup for one preset on stage 0
pub(crate) struct CombinerProgram {
    /// Applied whether or not a texture is bound
    pub shared: &'static [TexEnvSetting],
    /// Applied after `shared` when drawing untextured
    pub untextured: &'static [TexEnvSetting],
    /// Applied after `shared` when drawing textured
    pub textured: &'static [TexEnvSetting],
    /// Bind the white pixel texture when the caller gives none
    pub substitute_pixel: bool,
    /// Stage 0 always samples the pixel texture; a caller texture goes to stage 1
    pub pixel_stage: bool,
    pub rgb_scale: GLint,
}

const MODULATE: CombinerProgram = CombinerProgram {
    shared: &[(GL_TEXTURE_ENV_MODE, GL_MODULATE)],
    untextured: &[],
    textured: &[],
    substitute_pixel: false,
    pixel_stage: false,
    rgb_scale: 1,
};

const MUL_ALPHA: CombinerProgram = CombinerProgram {
    shared: &[
        (GL_TEXTURE_ENV_MODE, GL_COMBINE),
        (GL_COMBINE_RGB, GL_MODULATE),
        (GL_COMBINE_ALPHA, GL_REPLACE),
        (GL_SRC0_RGB, GL_PRIMARY_COLOR),
        (GL_SRC0_ALPHA, GL_PRIMARY_COLOR),
        (GL_SRC1_RGB, GL_PRIMARY_COLOR),
        (GL_SRC1_ALPHA, GL_PRIMARY_COLOR),
        (GL_OPERAND0_RGB, GL_SRC_ALPHA as GLint),
        (GL_OPERAND1_RGB, GL_SRC_COLOR as GLint),
        (GL_OPERAND0_ALPHA, GL_SRC_ALPHA as GLint),
        (GL_OPERAND1_ALPHA, GL_SRC_ALPHA as GLint),
    ],
    untextured: &[],
    textured: &[],
    substitute_pixel: true,
    pixel_stage: true,
    rgb_scale: 1,
};

const INVERT: CombinerProgram = CombinerProgram {
    shared: &[
        (GL_TEXTURE_ENV_MODE, GL_COMBINE),
        (GL_SRC0_RGB, GL_PRIMARY_COLOR),
        (GL_SRC0_ALPHA, GL_PRIMARY_COLOR),
        (GL_OPERAND0_RGB, GL_ONE_MINUS_SRC_COLOR as GLint),
        (GL_OPERAND0_ALPHA, GL_SRC_ALPHA as GLint),
    ],
    untextured: &[(GL_COMBINE_RGB, GL_REPLACE), (GL_COMBINE_ALPHA, GL_REPLACE)],
    textured: &[
        (GL_COMBINE_RGB, GL_MODULATE),
        (GL_COMBINE_ALPHA, GL_MODULATE),
        (GL_SRC1_RGB, GL_TEXTURE),
        (GL_SRC1_ALPHA, GL_TEXTURE),
        (GL_OPERAND1_RGB, GL_ONE_MINUS_SRC_COLOR as GLint),
        (GL_OPERAND1_ALPHA, GL_SRC_ALPHA as GLint),
    ],
    substitute_pixel: true,
    pixel_stage: false,
    rgb_scale: 1,
};

const X4: CombinerProgram = CombinerProgram {
    shared: &[
        (GL_TEXTURE_ENV_MODE, GL_COMBINE),
        (GL_COMBINE_RGB, GL_MODULATE),
        (GL_COMBINE_ALPHA, GL_MODULATE),
        (GL_SRC0_RGB, GL_PRIMARY_COLOR),
        (GL_SRC1_RGB, GL_TEXTURE),
        (GL_SRC0_ALPHA, GL_PRIMARY_COLOR),
        (GL_SRC1_ALPHA, GL_TEXTURE),
        (GL_OPERAND0_RGB, GL_SRC_COLOR as GLint),
        (GL_OPERAND1_RGB, GL_SRC_COLOR as GLint),
        (GL_OPERAND0_ALPHA, GL_SRC_ALPHA as GLint),
        (GL_OPERAND1_ALPHA, GL_SRC_ALPHA as GLint),
    ],
    untextured: &[],
    textured: &[],
    substitute_pixel: true,
    pixel_stage: false,
    rgb_scale: 4,
};

/// rgb = color.rgb * color.a, alpha = color.a
const PMA_COMBINE: &[TexEnvSetting] = &[
    (GL_TEXTURE_ENV_MODE, GL_COMBINE),
    (GL_COMBINE_RGB, GL_MODULATE),
    (GL_COMBINE_ALPHA, GL_REPLACE),
    (GL_SRC0_RGB, GL_PRIMARY_COLOR),
    (GL_SRC0_ALPHA, GL_PRIMARY_COLOR),
    (GL_SRC1_RGB, GL_PRIMARY_COLOR),
    (GL_SRC1_ALPHA, GL_PRIMARY_COLOR),
    (GL_OPERAND0_RGB, GL_SRC_COLOR as GLint),
    (GL_OPERAND1_RGB, GL_SRC_ALPHA as GLint),
    (GL_OPERAND0_ALPHA, GL_SRC_ALPHA as GLint),
];

const PMA: CombinerProgram = CombinerProgram {
    shared: PMA_COMBINE,
    untextured: &[],
    textured: &[],
    substitute_pixel: true,
    pixel_stage: true,
    rgb_scale: 1,
};

const PMA_INVERT: CombinerProgram = CombinerProgram {
    shared: &[],
    untextured: &[
        (GL_TEXTURE_ENV_MODE, GL_COMBINE),
        (GL_COMBINE_RGB, GL_MODULATE),
        (GL_COMBINE_ALPHA, GL_REPLACE),
        (GL_SRC0_RGB, GL_PRIMARY_COLOR),
        (GL_SRC0_ALPHA, GL_PRIMARY_COLOR),
        (GL_SRC1_RGB, GL_PRIMARY_COLOR),
        (GL_SRC1_ALPHA, GL_PRIMARY_COLOR),
        (GL_OPERAND0_RGB, GL_ONE_MINUS_SRC_COLOR as GLint),
        (GL_OPERAND1_RGB, GL_SRC_ALPHA as GLint),
        (GL_OPERAND0_ALPHA, GL_SRC_ALPHA as GLint),
    ],
    // Textured draws use the classic blend env against the vertex color
    textured: &[(GL_TEXTURE_ENV_MODE, GL_BLEND_ENV)],
    substitute_pixel: true,
    pixel_stage: false,
    rgb_scale: 1,
};

const PMA_X4: CombinerProgram = CombinerProgram { rgb_scale: 4, ..PMA };

/// Stage 1 combiner: previous stage times texture
const PREVIOUS_TIMES_TEXTURE: &[TexEnvSetting] = &[
    (GL_TEXTURE_ENV_MODE, GL_COMBINE),
    (GL_COMBINE_RGB, GL_MODULATE),
    (GL_COMBINE_ALPHA, GL_MODULATE),
    (GL_SRC0_RGB, GL_PREVIOUS),
    (GL_SRC0_ALPHA, GL_PREVIOUS),
    (GL_SRC1_RGB, GL_TEXTURE),
    (GL_SRC1_ALPHA, GL_TEXTURE),
    (GL_OPERAND0_RGB, GL_SRC_COLOR as GLint),
    (GL_OPERAND1_RGB, GL_SRC_COLOR as GLint),
    (GL_OPERAND0_ALPHA, GL_SRC_ALPHA as GLint),
    (GL_OPERAND1_ALPHA, GL_SRC_ALPHA as GLint),
];

pub(crate) fn combiner_program(preset: TexturePreset) -> &'static CombinerProgram {
    match preset {
        TexturePreset::Modulate => &MODULATE,
        TexturePreset::MulAlpha => &MUL_ALPHA,
        TexturePreset::Invert => &INVERT,
        TexturePreset::X4 => &X4,
        TexturePreset::Pma => &PMA,
        TexturePreset::PmaInvert => &PMA_INVERT,
        TexturePreset::PmaX4 => &PMA_X4,
    }
}

fn apply_settings(gl: &mut dyn GlApi, settings: &[TexEnvSetting]) {
    for &(pname, value) in settings {
        gl.tex_env_i(GL_TEXTURE_ENV, pname, value);
    }
}

/// Put the active stage back to plain modulate with unit scale
fn reset_stage_env(gl: &mut dyn GlApi) {
    gl.tex_env_i(GL_TEXTURE_ENV, GL_TEXTURE_ENV_MODE, GL_MODULATE);
    gl.tex_env_i(GL_TEXTURE_ENV, GL_RGB_SCALE, 1);
}

// ===== ENGINE =====

/// Texture-combiner realization of the preset programs
pub(crate) struct FixedFunctionEngine {
    /// 1x1 opaque white texture substituted for missing texture operands
    pixel_texture: Option<TextureId>,
    /// One past the highest stage configured by the last `apply`
    touched_stages: usize,
}

impl FixedFunctionEngine {
    /// Create the engine and its white pixel texture
    pub fn new(gl: &mut dyn GlApi, textures: &mut TextureManager) -> Result<Self> {
        let mut surface = Surface::new(1, 1, PixelFormat::Rgba8888);
        surface.set_pixel_rgba(0, 0, [0xFF, 0xFF, 0xFF, 0xFF]);
        let pixel = textures.create_from_surface(gl, &surface, false)?;
        engine_debug!("portgfx::gl::FixedFunction", "white pixel texture created");
        Ok(Self { pixel_texture: Some(pixel), touched_stages: 0 })
    }

    #[cfg(test)]
    pub fn pixel_texture(&self) -> Option<TextureId> {
        self.pixel_texture
    }

    /// Configure matrices, alpha test and combiners for `desc`
    pub fn apply(
        &mut self,
        gl: &mut dyn GlApi,
        textures: &mut TextureManager,
        stages: &mut TextureStages,
        desc: &PresetProgramDesc,
    ) -> Result<()> {
        if let Some(id) = desc.texture {
            if textures.get(id).is_none() {
                return Err(engine_err!("portgfx::gl::FixedFunction", InvalidHandle => "unknown texture {:?}", id));
            }
        }
        let program = combiner_program(desc.preset);

        // Stages above 0 left over from a two-stage preset
        for stage in 1..self.touched_stages.min(MAX_TEXTURE_STAGES) {
            stages.activate(gl, stage);
            reset_stage_env(gl);
            stages.set(gl, textures, stage, None, desc.draw_mode)?;
        }

        gl.matrix_mode(GL_PROJECTION);
        gl.load_matrix(&desc.projection.to_cols_array());
        gl.matrix_mode(GL_MODELVIEW);
        gl.load_matrix(&desc.view.to_cols_array());

        match desc.alpha_test {
            Some(test) => {
                gl.enable(GL_ALPHA_TEST);
                gl.alpha_func(alpha_func_to_gl(test.func), test.reference);
            }
            None => gl.disable(GL_ALPHA_TEST),
        }

        stages.activate(gl, 0);
        apply_settings(gl, program.shared);
        if desc.texture.is_some() {
            apply_settings(gl, program.textured);
        } else {
            apply_settings(gl, program.untextured);
        }
        gl.tex_env_i(GL_TEXTURE_ENV, GL_RGB_SCALE, 1);

        let pixel = self.pixel_texture.filter(|_| program.substitute_pixel);
        let (main_stage, main_texture) = match desc.texture {
            None => (0, pixel),
            Some(texture) if program.pixel_stage && pixel.is_some() => {
                stages.set(gl, textures, 0, pixel, desc.draw_mode)?;
                (1, Some(texture))
            }
            Some(texture) => (0, Some(texture)),
        };

        stages.set(gl, textures, main_stage, main_texture, desc.draw_mode)?;
        if main_stage != 0 {
            apply_settings(gl, PREVIOUS_TIMES_TEXTURE);
        }
        gl.tex_env_i(GL_TEXTURE_ENV, GL_RGB_SCALE, program.rgb_scale);

        self.touched_stages = main_stage + 1;
        Ok(())
    }

    /// Return every touched stage to modulate and unbind textures
    pub fn clear(&mut self, gl: &mut dyn GlApi, textures: &TextureManager, stages: &mut TextureStages) {
        for stage in 0..self.touched_stages.min(MAX_TEXTURE_STAGES) {
            stages.activate(gl, stage);
            reset_stage_env(gl);
        }
        gl.disable(GL_ALPHA_TEST);
        stages.clear(gl, textures);
        self.touched_stages = 0;
    }

    /// Release the pixel texture
    pub fn cleanup(&mut self, gl: &mut dyn GlApi, textures: &mut TextureManager) {
        if let Some(pixel) = self.pixel_texture.take() {
            let _ = textures.release(gl, pixel);
        }
    }
}

// ===== CLIENT-ARRAY VERTEX BINDING =====

/// Point the fixed-function client arrays at `definition`'s elements
///
/// `vertices` is `None` when the data lives in the bound array buffer.
///
/// # Safety
///
/// Client vertex bytes must outlive the following draw call.
pub(crate) unsafe fn bind_client_arrays(gl: &mut dyn GlApi, definition: &VertexDefinition, vertices: Option<&[u8]>) {
    let stride = definition.stride as GLsizei;
    for element in &definition.elements {
        let size = element.components as GLint;
        let ty = component_type_to_gl(element.component_type);
        let pointer = element_pointer(vertices, element);
        match element.kind {
            VertexElementKind::Position => {
                gl.enable_client_state(GL_VERTEX_ARRAY);
                gl.vertex_pointer(size, ty, stride, pointer);
            }
            VertexElementKind::Color => {
                gl.enable_client_state(GL_COLOR_ARRAY);
                gl.color_pointer(size, ty, stride, pointer);
            }
            kind => {
                let slot = kind.texcoord_slot().unwrap_or(0) as GLenum;
                gl.client_active_texture(GL_TEXTURE0 + slot);
                gl.enable_client_state(GL_TEXTURE_COORD_ARRAY);
                gl.tex_coord_pointer(size, ty, stride, pointer);
            }
        }
    }
}

/// Disable the client arrays enabled by [`bind_client_arrays`]
pub(crate) fn unbind_client_arrays(gl: &mut dyn GlApi, definition: &VertexDefinition) {
    for element in &definition.elements {
        match element.kind {
            VertexElementKind::Position => gl.disable_client_state(GL_VERTEX_ARRAY),
            VertexElementKind::Color => gl.disable_client_state(GL_COLOR_ARRAY),
            kind => {
                let slot = kind.texcoord_slot().unwrap_or(0) as GLenum;
                gl.client_active_texture(GL_TEXTURE0 + slot);
                gl.disable_client_state(GL_TEXTURE_COORD_ARRAY);
            }
        }
    }
    gl.client_active_texture(GL_TEXTURE0);
}

#[cfg(test)]
#[path = "gl_fixed_function_tests.rs"]
mod tests;
