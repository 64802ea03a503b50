/// Framebuffer and renderbuffer pools
///
/// Framebuffer objects are shared between render-target textures of the same
/// logical size: acquiring a size that already has a live framebuffer only
/// increments its reference count. Renderbuffers are depth-stencil targets,
/// reference counted the same way. Binding takes one extra reference on the
/// bound framebuffer and renderbuffer, dropped when something else is bound.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use portgfx::portgfx::graphics::RenderbufferId;
use portgfx::portgfx::Result;
use portgfx::{engine_bail, engine_debug, engine_warn};
use crate::gl_api::*;
use crate::gl_debug::clear_errors;

new_key_type! {
    /// Key of a pooled framebuffer object
    pub struct FramebufferId;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FramebufferInfo {
    pub native: GLuint,
    pub width: u32,
    pub height: u32,
    pub ref_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RenderbufferInfo {
    pub native: GLuint,
    pub width: u32,
    pub height: u32,
    pub ref_count: u32,
}

/// What is currently bound as render target
///
/// The three fields change together: a bound texture name always belongs to
/// the bound framebuffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoundFramebuffer {
    pub framebuffer: Option<FramebufferId>,
    pub texture_name: GLuint,
    pub renderbuffer: Option<RenderbufferId>,
}

/// Color attachment requested by a bind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ColorTarget {
    pub framebuffer: FramebufferId,
    pub texture_target: GLenum,
    pub texture_name: GLuint,
}

#[derive(Default)]
pub(crate) struct FramebufferPool {
    framebuffers: SlotMap<FramebufferId, FramebufferInfo>,
    by_size: FxHashMap<(u32, u32), FramebufferId>,
    renderbuffers: SlotMap<RenderbufferId, RenderbufferInfo>,
    bound: BoundFramebuffer,
}

impl FramebufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self) -> BoundFramebuffer {
        self.bound
    }

    #[cfg(test)]
    pub fn framebuffer(&self, id: FramebufferId) -> Option<&FramebufferInfo> {
        self.framebuffers.get(id)
    }

    pub fn renderbuffer(&self, id: RenderbufferId) -> Option<&RenderbufferInfo> {
        self.renderbuffers.get(id)
    }

    #[cfg(test)]
    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    // ===== FRAMEBUFFERS =====

    /// Reuse the live framebuffer of this size or create one
    pub fn acquire(&mut self, gl: &mut dyn GlApi, width: u32, height: u32) -> Result<FramebufferId> {
        if let Some(&id) = self.by_size.get(&(width, height)) {
            if let Some(info) = self.framebuffers.get_mut(id) {
                info.ref_count += 1;
                engine_debug!(
                    "portgfx::gl::Framebuffer",
                    "Reusing framebuffer {} ({}x{}, refs {})",
                    info.native, width, height, info.ref_count
                );
                return Ok(id);
            }
        }

        // Create framebuffer object
        clear_errors(gl);
        let native = gl.gen_framebuffer();
        let error = gl.get_error();
        if native == 0 || error != GL_NO_ERROR {
            if native != 0 {
                gl.delete_framebuffer(native);
            }
            engine_bail!(
                "portgfx::gl::Framebuffer",
                AllocationFailed => "glGenFramebuffers failed for {}x{}: {}",
                width, height, gl_error_name(error)
            );
        }

        let id = self.framebuffers.insert(FramebufferInfo { native, width, height, ref_count: 1 });
        self.by_size.insert((width, height), id);
        engine_debug!("portgfx::gl::Framebuffer", "Created framebuffer {} ({}x{})", native, width, height);
        Ok(id)
    }

    /// Drop one reference; the last one deletes the native object
    pub fn release(&mut self, gl: &mut dyn GlApi, id: FramebufferId) {
        let Some(info) = self.framebuffers.get_mut(id) else {
            engine_warn!("portgfx::gl::Framebuffer", "Release of unknown framebuffer {:?}", id);
            return;
        };
        info.ref_count = info.ref_count.saturating_sub(1);
        if info.ref_count > 0 {
            return;
        }

        let info = *info;
        if info.native != 0 {
            gl.delete_framebuffer(info.native);
        }
        self.framebuffers.remove(id);
        if self.by_size.get(&(info.width, info.height)) == Some(&id) {
            self.by_size.remove(&(info.width, info.height));
        }
        engine_debug!("portgfx::gl::Framebuffer", "Deleted framebuffer {}", info.native);
    }

    // ===== RENDERBUFFERS =====

    pub fn create_renderbuffer(&mut self, gl: &mut dyn GlApi, width: u32, height: u32) -> Result<RenderbufferId> {
        clear_errors(gl);
        let native = gl.gen_renderbuffer();
        if native == 0 {
            engine_bail!(
                "portgfx::gl::Renderbuffer",
                AllocationFailed => "glGenRenderbuffers failed for {}x{}",
                width, height
            );
        }
        gl.bind_renderbuffer(native);
        gl.renderbuffer_storage(GL_DEPTH24_STENCIL8, width as GLsizei, height as GLsizei);
        gl.bind_renderbuffer(0);

        let error = gl.get_error();
        if error != GL_NO_ERROR {
            gl.delete_renderbuffer(native);
            engine_bail!(
                "portgfx::gl::Renderbuffer",
                AllocationFailed => "depth-stencil storage {}x{} failed: {}",
                width, height, gl_error_name(error)
            );
        }

        Ok(self.renderbuffers.insert(RenderbufferInfo { native, width, height, ref_count: 1 }))
    }

    pub fn release_renderbuffer(&mut self, gl: &mut dyn GlApi, id: RenderbufferId) -> Result<()> {
        let Some(info) = self.renderbuffers.get_mut(id) else {
            engine_bail!("portgfx::gl::Renderbuffer", InvalidHandle => "unknown renderbuffer {:?}", id);
        };
        info.ref_count = info.ref_count.saturating_sub(1);
        if info.ref_count == 0 {
            if info.native != 0 {
                gl.delete_renderbuffer(info.native);
            }
            self.renderbuffers.remove(id);
        }
        Ok(())
    }

    // ===== BINDING =====

    /// Make `target` the render target (`None` for the default framebuffer)
    ///
    /// Returns `true` when a framebuffer object was newly bound, `false` for
    /// a no-op or the default target.
    pub fn bind(
        &mut self,
        gl: &mut dyn GlApi,
        target: Option<ColorTarget>,
        renderbuffer: Option<RenderbufferId>,
    ) -> Result<bool> {
        let requested = match target {
            Some(t) => BoundFramebuffer {
                framebuffer: Some(t.framebuffer),
                texture_name: t.texture_name,
                renderbuffer,
            },
            None => BoundFramebuffer::default(),
        };
        if requested == self.bound {
            return Ok(false);
        }

        // Drop the previous binding's references
        let previous = std::mem::take(&mut self.bound);
        if let Some(fb) = previous.framebuffer {
            self.release(gl, fb);
        }
        if let Some(rb) = previous.renderbuffer {
            // Already gone when released by its owner while bound
            let _ = self.release_renderbuffer(gl, rb);
        }

        let Some(target) = target else {
            gl.bind_framebuffer(GL_FRAMEBUFFER, 0);
            return Ok(false);
        };
        let Some(info) = self.framebuffers.get(target.framebuffer).copied() else {
            gl.bind_framebuffer(GL_FRAMEBUFFER, 0);
            engine_bail!("portgfx::gl::Framebuffer", InvalidHandle => "unknown framebuffer {:?}", target.framebuffer);
        };

        // Attach color and optional depth-stencil
        gl.bind_framebuffer(GL_FRAMEBUFFER, info.native);
        gl.framebuffer_texture_2d(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, target.texture_target, target.texture_name);
        let depth_stencil = renderbuffer
            .and_then(|rb| self.renderbuffers.get(rb))
            .map_or(0, |rb| rb.native);
        gl.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_DEPTH_ATTACHMENT, depth_stencil);
        gl.framebuffer_renderbuffer(GL_FRAMEBUFFER, GL_STENCIL_ATTACHMENT, depth_stencil);

        let status = gl.check_framebuffer_status(GL_FRAMEBUFFER);
        if status != GL_FRAMEBUFFER_COMPLETE {
            gl.bind_framebuffer(GL_FRAMEBUFFER, 0);
            engine_bail!(
                "portgfx::gl::Framebuffer",
                IncompleteFramebuffer => "framebuffer {} status 0x{:04x}",
                info.native, status
            );
        }

        gl.viewport(0, 0, info.width as GLsizei, info.height as GLsizei);

        if let Some(fb) = self.framebuffers.get_mut(target.framebuffer) {
            fb.ref_count += 1;
        }
        if let Some(rb) = renderbuffer.and_then(|rb| self.renderbuffers.get_mut(rb)) {
            rb.ref_count += 1;
        }
        self.bound = requested;
        Ok(true)
    }

    // ===== CONTEXT LOSS =====

    /// Delete every native renderbuffer, keeping the keys
    pub fn clear_renderbuffer_natives(&mut self, gl: &mut dyn GlApi) {
        for (_, rb) in self.renderbuffers.iter_mut() {
            if rb.native != 0 {
                gl.delete_renderbuffer(rb.native);
                rb.native = 0;
            }
        }
    }

    /// Delete and forget every remaining framebuffer
    pub fn clear_framebuffer_natives(&mut self, gl: &mut dyn GlApi) {
        for (_, fb) in self.framebuffers.iter_mut() {
            if fb.native != 0 {
                gl.delete_framebuffer(fb.native);
                fb.native = 0;
            }
        }
        self.framebuffers.clear();
        self.by_size.clear();
    }
}

#[cfg(test)]
#[path = "gl_frame_buffer_tests.rs"]
mod tests;
