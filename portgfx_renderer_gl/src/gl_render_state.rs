/// Render state - GL enum mapping, state setters and texture stage tracking

use portgfx::portgfx::graphics::{
    AlphaTestFunc, BlendEquation, BlendFactor, Bounds, ClearFlags, ComponentType, DepthFunc,
    DrawMode, PrimitiveType, Rect, TextureId, VertexElement, MAX_TEXTURE_STAGES,
};
use portgfx::portgfx::Result;
use portgfx::{engine_bail, engine_err};
use crate::gl_api::*;
use crate::gl_texture::TextureManager;

// ===== ENUM MAPPING =====

pub(crate) fn blend_factor_to_gl(factor: BlendFactor) -> GLenum {
    match factor {
        BlendFactor::Zero => GL_ZERO,
        BlendFactor::One => GL_ONE,
        BlendFactor::SrcColor => GL_SRC_COLOR,
        BlendFactor::DstColor => GL_DST_COLOR,
        BlendFactor::SrcAlpha => GL_SRC_ALPHA,
        BlendFactor::DstAlpha => GL_DST_ALPHA,
        BlendFactor::OneMinusSrcColor => GL_ONE_MINUS_SRC_COLOR,
        BlendFactor::OneMinusDstColor => GL_ONE_MINUS_DST_COLOR,
        BlendFactor::OneMinusSrcAlpha => GL_ONE_MINUS_SRC_ALPHA,
        BlendFactor::OneMinusDstAlpha => GL_ONE_MINUS_DST_ALPHA,
    }
}

/// Native blend equation, `None` when blending is disabled
pub(crate) fn blend_equation_to_gl(equation: BlendEquation) -> Option<GLenum> {
    match equation {
        BlendEquation::Disable => None,
        BlendEquation::Add => Some(GL_FUNC_ADD),
        BlendEquation::ReverseSubtract => Some(GL_FUNC_REVERSE_SUBTRACT),
    }
}

pub(crate) fn depth_func_to_gl(func: DepthFunc) -> GLenum {
    match func {
        DepthFunc::Never => GL_NEVER,
        DepthFunc::Less => GL_LESS,
        DepthFunc::LessEqual => GL_LEQUAL,
        DepthFunc::Equal => GL_EQUAL,
        DepthFunc::GreaterEqual => GL_GEQUAL,
        DepthFunc::Greater => GL_GREATER,
        DepthFunc::NotEqual => GL_NOTEQUAL,
        DepthFunc::Always => GL_ALWAYS,
    }
}

pub(crate) fn alpha_func_to_gl(func: AlphaTestFunc) -> GLenum {
    match func {
        AlphaTestFunc::Equal => GL_EQUAL,
        AlphaTestFunc::NotEqual => GL_NOTEQUAL,
        AlphaTestFunc::Less => GL_LESS,
        AlphaTestFunc::LessEqual => GL_LEQUAL,
        AlphaTestFunc::Greater => GL_GREATER,
        AlphaTestFunc::GreaterEqual => GL_GEQUAL,
    }
}

pub(crate) fn primitive_to_gl(primitive: PrimitiveType) -> GLenum {
    match primitive {
        PrimitiveType::Points => GL_POINTS,
        PrimitiveType::Lines => GL_LINES,
        PrimitiveType::Triangles => GL_TRIANGLES,
        PrimitiveType::TriangleFan => GL_TRIANGLE_FAN,
        PrimitiveType::TriangleStrip => GL_TRIANGLE_STRIP,
    }
}

pub(crate) fn component_type_to_gl(ty: ComponentType) -> GLenum {
    match ty {
        ComponentType::Float => GL_FLOAT,
        ComponentType::UnsignedByte => GL_UNSIGNED_BYTE,
    }
}

/// Where `element` is read from: client vertex bytes, or an offset into the
/// bound array buffer when `vertices` is `None`
pub(crate) fn element_pointer<'a>(vertices: Option<&'a [u8]>, element: &VertexElement) -> AttribPointer<'a> {
    match vertices {
        Some(data) => AttribPointer::Client(data.get(element.offset..).unwrap_or(&[])),
        None => AttribPointer::Offset(element.offset),
    }
}

// ===== STATE SETTERS =====

pub(crate) fn set_blend_mode(gl: &mut dyn GlApi, equation: BlendEquation, src: BlendFactor, dst: BlendFactor) {
    let Some(equation) = blend_equation_to_gl(equation) else {
        gl.disable(GL_BLEND);
        return;
    };
    gl.blend_func(blend_factor_to_gl(src), blend_factor_to_gl(dst));
    gl.blend_equation(equation);
    gl.enable(GL_BLEND);
}

pub(crate) fn set_blend_mode_separate(
    gl: &mut dyn GlApi,
    equation: BlendEquation,
    src_rgb: BlendFactor,
    dst_rgb: BlendFactor,
    src_alpha: BlendFactor,
    dst_alpha: BlendFactor,
) {
    let Some(equation) = blend_equation_to_gl(equation) else {
        gl.disable(GL_BLEND);
        return;
    };
    gl.blend_func_separate(
        blend_factor_to_gl(src_rgb),
        blend_factor_to_gl(dst_rgb),
        blend_factor_to_gl(src_alpha),
        blend_factor_to_gl(dst_alpha),
    );
    gl.blend_equation(equation);
    gl.enable(GL_BLEND);
}

pub(crate) fn set_scissor(gl: &mut dyn GlApi, rect: Rect) {
    gl.enable(GL_SCISSOR_TEST);
    gl.scissor(rect.x, rect.y, rect.w, rect.h);
}

pub(crate) fn set_scissor_bounds(gl: &mut dyn GlApi, bounds: Option<Bounds>) {
    match bounds {
        Some(bounds) => set_scissor(gl, bounds.to_rect()),
        None => gl.disable(GL_SCISSOR_TEST),
    }
}

/// Clear the selected buffers, then reset the depth function to less-or-equal
pub(crate) fn clear(gl: &mut dyn GlApi, flags: ClearFlags) {
    let mut mask = 0;
    if flags.contains(ClearFlags::COLOR) {
        mask |= GL_COLOR_BUFFER_BIT;
    }
    if flags.contains(ClearFlags::DEPTH) {
        mask |= GL_DEPTH_BUFFER_BIT;
    }
    gl.clear(mask);
    gl.depth_func(GL_LEQUAL);
}

// ===== TEXTURE STAGES =====

/// Textures bound per stage since the last clear
///
/// `count` is one past the highest stage bound, so clearing only touches
/// stages that were used.
#[derive(Debug, Default)]
pub(crate) struct TextureStages {
    bound: [Option<TextureId>; MAX_TEXTURE_STAGES],
    count: usize,
    /// Stage selected with glActiveTexture
    active: usize,
}

impl TextureStages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self, stage: usize) -> Option<TextureId> {
        self.bound.get(stage).copied().flatten()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn activate(&mut self, gl: &mut dyn GlApi, stage: usize) {
        gl.active_texture(GL_TEXTURE0 + stage as GLenum);
        self.active = stage;
    }

    /// Bind `texture` (or nothing) to `stage`
    pub fn set(
        &mut self,
        gl: &mut dyn GlApi,
        textures: &mut TextureManager,
        stage: usize,
        texture: Option<TextureId>,
        mode: DrawMode,
    ) -> Result<()> {
        if stage >= MAX_TEXTURE_STAGES {
            engine_bail!("portgfx::gl::RenderState", "texture stage {} out of range", stage);
        }
        let new_target = match texture {
            Some(id) => Some(
                textures
                    .get(id)
                    .ok_or_else(|| engine_err!("portgfx::gl::RenderState", InvalidHandle => "unknown texture {:?}", id))?
                    .target,
            ),
            None => None,
        };

        self.activate(gl, stage);

        // A different target left enabled on this unit would take precedence
        if let Some(previous) = self.bound[stage] {
            let previous_target = textures.get(previous).map(|t| t.target);
            if previous_target != new_target {
                textures.unbind(gl, previous);
            }
        }

        if let Some(id) = texture {
            textures.bind(gl, id, mode)?;
        }
        self.bound[stage] = texture;
        self.count = self.count.max(stage + 1);
        Ok(())
    }

    /// Unbind every stage used since the last clear and select stage 0
    pub fn clear(&mut self, gl: &mut dyn GlApi, textures: &TextureManager) {
        for stage in 0..self.count {
            self.activate(gl, stage);
            if let Some(id) = self.bound[stage].take() {
                textures.unbind(gl, id);
            }
        }
        self.count = 0;
        self.activate(gl, 0);
    }

    /// Restore the active unit's binding after a texture upload rebound it
    pub fn rebind_active(&mut self, gl: &mut dyn GlApi, textures: &mut TextureManager) {
        let stage = self.active;
        if let Some(id) = self.bound[stage] {
            let mode = textures.get(id).map(|t| t.draw_mode).unwrap_or_default();
            if textures.bind(gl, id, mode).is_err() {
                self.bound[stage] = None;
            }
        }
    }

    /// Unbind `texture` from every stage holding it, keeping the active stage
    ///
    /// Called before the texture's native object is destroyed.
    pub fn unbind_texture(&mut self, gl: &mut dyn GlApi, textures: &TextureManager, texture: TextureId) {
        let active = self.active;
        for stage in 0..self.count {
            if self.bound[stage] == Some(texture) {
                self.activate(gl, stage);
                textures.unbind(gl, texture);
                self.bound[stage] = None;
            }
        }
        if self.active != active {
            self.activate(gl, active);
        }
    }
}

#[cfg(test)]
#[path = "gl_render_state_tests.rs"]
mod tests;
