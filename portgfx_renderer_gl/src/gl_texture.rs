/// Texture manager - reference-counted GL textures, render targets and pixel
/// transfer
///
/// Textures are stored in a slot map keyed by `TextureId`. Each record keeps
/// the logical size asked for and the factors that map pixel coordinates to
/// the native addressing of the physical size allocated. Render-target
/// textures additionally hold a reference on a pooled framebuffer of the same
/// logical size (see `gl_frame_buffer`).

use slotmap::SlotMap;
use portgfx::portgfx::graphics::{
    Capabilities, DrawMode, PixelFormat, Rect, RenderbufferId, Surface, TextureId, TextureInfo,
    TextureReleaseCallback,
};
use portgfx::portgfx::Result;
use portgfx::{engine_bail, engine_debug, engine_err};
use crate::gl_api::*;
use crate::gl_context::GlProfile;
use crate::gl_debug::clear_errors;
use crate::gl_frame_buffer::{ColorTarget, FramebufferId, FramebufferPool};

/// Native texture record
pub(crate) struct GlTexture {
    pub native: GLuint,
    pub target: GLenum,
    pub width: u32,
    pub height: u32,
    pub width_mult: f32,
    pub height_mult: f32,
    pub draw_mode: DrawMode,
    pub has_alpha: bool,
    /// Power-of-two textures can repeat; padded and rectangle ones cannot
    pub wrappable: bool,
    pub framebuffer: Option<FramebufferId>,
    /// Render targets are cleared the first time they are bound
    pub needs_clear: bool,
    pub ref_count: u32,
    release_callback: Option<TextureReleaseCallback>,
}

/// Native layout chosen for a logical texture size
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct TextureLayout {
    pub target: GLenum,
    pub physical_width: u32,
    pub physical_height: u32,
    pub width_mult: f32,
    pub height_mult: f32,
    pub wrappable: bool,
}

/// Pick target and physical size for a `width` x `height` texture
///
/// Power-of-two sizes use `GL_TEXTURE_2D` as is. Other sizes use the
/// non-power-of-two path when available, then rectangle textures on desktop
/// contexts (unnormalized coordinates, multipliers of 1), and otherwise pad
/// up to the next power of two.
pub(crate) fn texture_layout(caps: &Capabilities, profile: GlProfile, width: u32, height: u32) -> TextureLayout {
    let normalized = |pw: u32, ph: u32, wrappable: bool| TextureLayout {
        target: GL_TEXTURE_2D,
        physical_width: pw,
        physical_height: ph,
        width_mult: 1.0 / pw as f32,
        height_mult: 1.0 / ph as f32,
        wrappable,
    };

    if width.is_power_of_two() && height.is_power_of_two() {
        normalized(width, height, true)
    } else if caps.has_npt_support {
        normalized(width, height, false)
    } else if caps.has_texture_rectangle_support && profile == GlProfile::Desktop {
        TextureLayout {
            target: GL_TEXTURE_RECTANGLE,
            physical_width: width,
            physical_height: height,
            width_mult: 1.0,
            height_mult: 1.0,
            wrappable: false,
        }
    } else {
        normalized(width.next_power_of_two(), height.next_power_of_two(), false)
    }
}

fn filter_for(mode: DrawMode) -> GLint {
    match mode {
        DrawMode::Nearest => GL_NEAREST,
        DrawMode::Bilinear => GL_LINEAR,
    }
}

pub(crate) struct TextureManager {
    textures: SlotMap<TextureId, GlTexture>,
    framebuffers: FramebufferPool,
    capabilities: Capabilities,
    profile: GlProfile,
}

impl TextureManager {
    pub fn new(capabilities: Capabilities, profile: GlProfile) -> Self {
        Self {
            textures: SlotMap::with_key(),
            framebuffers: FramebufferPool::new(),
            capabilities,
            profile,
        }
    }

    /// Fixed-function contexts need the texture target enabled around binds
    fn toggles_targets(&self) -> bool {
        self.profile == GlProfile::Desktop
    }

    pub fn get(&self, id: TextureId) -> Option<&GlTexture> {
        self.textures.get(id)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    #[cfg(test)]
    pub fn framebuffers(&self) -> &FramebufferPool {
        &self.framebuffers
    }

    fn lookup(&self, id: TextureId) -> Result<&GlTexture> {
        self.textures
            .get(id)
            .ok_or_else(|| engine_err!("portgfx::gl::Texture", InvalidHandle => "unknown texture {:?}", id))
    }

    fn lookup_mut(&mut self, id: TextureId) -> Result<&mut GlTexture> {
        self.textures
            .get_mut(id)
            .ok_or_else(|| engine_err!("portgfx::gl::Texture", InvalidHandle => "unknown texture {:?}", id))
    }

    // ===== CREATION =====

    pub fn create(&mut self, gl: &mut dyn GlApi, width: u32, height: u32, has_alpha: bool) -> Result<TextureId> {
        if width == 0 || height == 0 {
            engine_bail!("portgfx::gl::Texture", AllocationFailed => "empty texture {}x{}", width, height);
        }

        let layout = texture_layout(&self.capabilities, self.profile, width, height);
        if layout.physical_width > self.capabilities.max_texture_width
            || layout.physical_height > self.capabilities.max_texture_height
        {
            engine_bail!(
                "portgfx::gl::Texture",
                AllocationFailed => "texture {}x{} (physical {}x{}) exceeds maximum {}x{}",
                width, height, layout.physical_width, layout.physical_height,
                self.capabilities.max_texture_width, self.capabilities.max_texture_height
            );
        }

        clear_errors(gl);
        let native = gl.gen_texture();
        let error = gl.get_error();
        if native == 0 || error != GL_NO_ERROR {
            engine_bail!("portgfx::gl::Texture", AllocationFailed => "glGenTextures failed: {}", gl_error_name(error));
        }

        let wrap = if layout.wrappable { GL_REPEAT } else { GL_CLAMP_TO_EDGE };
        if self.toggles_targets() {
            gl.enable(layout.target);
        }
        gl.bind_texture(layout.target, native);
        gl.tex_parameter_i(layout.target, GL_TEXTURE_MIN_FILTER, GL_NEAREST);
        gl.tex_parameter_i(layout.target, GL_TEXTURE_MAG_FILTER, GL_NEAREST);
        gl.tex_parameter_i(layout.target, GL_TEXTURE_WRAP_S, wrap);
        gl.tex_parameter_i(layout.target, GL_TEXTURE_WRAP_T, wrap);
        gl.tex_image_2d(
            layout.target,
            GL_RGBA as GLint,
            layout.physical_width as GLsizei,
            layout.physical_height as GLsizei,
            GL_RGBA,
            GL_UNSIGNED_BYTE,
            None,
        );
        if self.toggles_targets() {
            gl.disable(layout.target);
        }

        let error = gl.get_error();
        if error != GL_NO_ERROR {
            gl.delete_texture(native);
            engine_bail!(
                "portgfx::gl::Texture",
                AllocationFailed => "glTexImage2D {}x{} failed: {}",
                layout.physical_width, layout.physical_height, gl_error_name(error)
            );
        }

        engine_debug!(
            "portgfx::gl::Texture",
            "Created texture {} ({}x{}, physical {}x{}, target 0x{:04x})",
            native, width, height, layout.physical_width, layout.physical_height, layout.target
        );

        Ok(self.textures.insert(GlTexture {
            native,
            target: layout.target,
            width,
            height,
            width_mult: layout.width_mult,
            height_mult: layout.height_mult,
            draw_mode: DrawMode::Nearest,
            has_alpha,
            wrappable: layout.wrappable,
            framebuffer: None,
            needs_clear: false,
            ref_count: 1,
            release_callback: None,
        }))
    }

    /// Create a texture sized like `surface` and upload its pixels
    ///
    /// A color-keyed surface always produces a texture with alpha.
    pub fn create_from_surface(&mut self, gl: &mut dyn GlApi, surface: &Surface, has_alpha: bool) -> Result<TextureId> {
        let has_alpha = has_alpha || surface.color_key().is_some();
        let id = self.create(gl, surface.width(), surface.height(), has_alpha)?;
        if let Err(e) = self.blit(gl, id, surface, None) {
            self.release(gl, id)?;
            return Err(e);
        }
        Ok(id)
    }

    /// Create a texture usable as render target
    pub fn create_render_target(&mut self, gl: &mut dyn GlApi, width: u32, height: u32, has_alpha: bool) -> Result<TextureId> {
        if !self.capabilities.has_framebuffer_support {
            engine_bail!("portgfx::gl::Texture", CapabilityUnsupported => "render target textures need framebuffer objects");
        }
        let id = self.create(gl, width, height, has_alpha)?;
        let framebuffer = match self.framebuffers.acquire(gl, width, height) {
            Ok(fb) => fb,
            Err(e) => {
                self.release(gl, id)?;
                return Err(e);
            }
        };
        let texture = self.lookup_mut(id)?;
        texture.framebuffer = Some(framebuffer);
        texture.needs_clear = true;
        Ok(id)
    }

    // ===== PIXEL TRANSFER =====

    /// Upload `rect` of `surface` to the same position in the texture
    pub fn blit(&mut self, gl: &mut dyn GlApi, id: TextureId, surface: &Surface, rect: Option<Rect>) -> Result<()> {
        let texture = self.lookup(id)?;
        if texture.native == 0 {
            engine_bail!("portgfx::gl::Texture", "texture {:?} has no native object (context lost)", id);
        }
        let rect = rect.unwrap_or(Rect::new(0, 0, surface.width() as i32, surface.height() as i32));
        if !rect.fits_within(surface.width(), surface.height()) {
            engine_bail!(
                "portgfx::gl::Texture",
                "blit rect {:?} outside {}x{} surface", rect, surface.width(), surface.height()
            );
        }
        if !rect.fits_within(texture.width, texture.height) {
            engine_bail!(
                "portgfx::gl::Texture",
                "blit rect {:?} outside {}x{} texture", rect, texture.width, texture.height
            );
        }
        if rect.w == 0 || rect.h == 0 {
            return Ok(());
        }

        // Native layout is RGBA bytes; keyed surfaces get alpha from the key
        let converted;
        let source = if surface.format() != PixelFormat::Rgba8888 || surface.color_key().is_some() {
            converted = surface.convert(PixelFormat::Rgba8888);
            &converted
        } else {
            surface
        };

        let (target, native) = (texture.target, texture.native);
        if self.toggles_targets() {
            gl.enable(target);
        }
        gl.bind_texture(target, native);
        upload_rect(gl, target, source, rect);
        if self.toggles_targets() {
            gl.disable(target);
        }
        Ok(())
    }

    /// Read back `rect` of the current render target
    pub fn read_framebuffer(&self, gl: &mut dyn GlApi, rect: Rect) -> Result<Surface> {
        if rect.w < 0 || rect.h < 0 {
            engine_bail!("portgfx::gl::Texture", "invalid read rect {:?}", rect);
        }
        let (format, gl_format, gl_type) = match self.profile {
            GlProfile::Desktop => (PixelFormat::Bgra8888, GL_BGRA, GL_UNSIGNED_INT_8_8_8_8_REV),
            GlProfile::Es2 => (PixelFormat::Rgba8888, GL_RGBA, GL_UNSIGNED_BYTE),
        };
        let mut surface = Surface::new(rect.w as u32, rect.h as u32, format);
        gl.pixel_store_i(GL_PACK_ALIGNMENT, 1);
        gl.read_pixels(rect.x, rect.y, rect.w, rect.h, gl_format, gl_type, surface.pixels_mut());
        Ok(surface)
    }

    // ===== PROPERTIES =====

    pub fn info(&self, id: TextureId) -> Result<TextureInfo> {
        let texture = self.lookup(id)?;
        Ok(TextureInfo {
            width: texture.width,
            height: texture.height,
            width_mult: texture.width_mult,
            height_mult: texture.height_mult,
        })
    }

    pub fn has_alpha(&self, id: TextureId) -> bool {
        self.textures.get(id).is_some_and(|t| t.has_alpha)
    }

    /// Repeat only takes effect on wrappable textures; others stay clamped
    pub fn set_wrap(&mut self, gl: &mut dyn GlApi, id: TextureId, wrap: bool) -> Result<()> {
        let toggles = self.toggles_targets();
        let texture = self.lookup(id)?;
        let mode = if wrap && texture.wrappable { GL_REPEAT } else { GL_CLAMP_TO_EDGE };
        if texture.native == 0 {
            return Ok(());
        }
        if toggles {
            gl.enable(texture.target);
        }
        gl.bind_texture(texture.target, texture.native);
        gl.tex_parameter_i(texture.target, GL_TEXTURE_WRAP_S, mode);
        gl.tex_parameter_i(texture.target, GL_TEXTURE_WRAP_T, mode);
        if toggles {
            gl.disable(texture.target);
        }
        Ok(())
    }

    pub fn set_release_callback(&mut self, id: TextureId, callback: TextureReleaseCallback) -> Result<()> {
        self.lookup_mut(id)?.release_callback = Some(callback);
        Ok(())
    }

    // ===== REFERENCE COUNTING =====

    pub fn add_ref(&mut self, id: TextureId) -> Result<()> {
        self.lookup_mut(id)?.ref_count += 1;
        Ok(())
    }

    /// Drop one reference; the last one runs the release callback and frees
    /// the native texture and its framebuffer reference
    ///
    /// A render target freed while bound leaves the default framebuffer bound.
    pub fn release(&mut self, gl: &mut dyn GlApi, id: TextureId) -> Result<()> {
        let texture = self.lookup_mut(id)?;
        texture.ref_count = texture.ref_count.saturating_sub(1);
        if texture.ref_count > 0 {
            return Ok(());
        }

        if let Some(mut callback) = texture.release_callback.take() {
            callback(id);
        }
        let Some(texture) = self.textures.remove(id) else {
            return Ok(());
        };
        let bound = self.framebuffers.bound();
        if texture.framebuffer.is_some()
            && bound.framebuffer == texture.framebuffer
            && bound.texture_name == texture.native
        {
            // Bound state must not outlive the texture it names
            self.framebuffers.bind(gl, None, None)?;
        }
        if texture.native != 0 {
            gl.delete_texture(texture.native);
        }
        if let Some(fb) = texture.framebuffer {
            self.framebuffers.release(gl, fb);
        }
        engine_debug!("portgfx::gl::Texture", "Released texture {}", texture.native);
        Ok(())
    }

    // ===== BINDING =====

    /// Bind to the active unit, updating filters when the draw mode changed
    pub fn bind(&mut self, gl: &mut dyn GlApi, id: TextureId, mode: DrawMode) -> Result<()> {
        let toggles = self.toggles_targets();
        let texture = self.lookup_mut(id)?;
        if toggles {
            gl.enable(texture.target);
        }
        gl.bind_texture(texture.target, texture.native);
        if texture.draw_mode != mode {
            let filter = filter_for(mode);
            gl.tex_parameter_i(texture.target, GL_TEXTURE_MIN_FILTER, filter);
            gl.tex_parameter_i(texture.target, GL_TEXTURE_MAG_FILTER, filter);
            texture.draw_mode = mode;
        }
        Ok(())
    }

    /// Disable the texture's target on the active unit
    pub fn unbind(&self, gl: &mut dyn GlApi, id: TextureId) {
        if !self.toggles_targets() {
            return;
        }
        if let Some(texture) = self.textures.get(id) {
            gl.disable(texture.target);
        }
    }

    // ===== RENDER TARGETS =====

    /// Render into `texture` (`None` for the default framebuffer)
    ///
    /// Returns `true` when the target was cleared on its first bind, which
    /// leaves the GL clear color modified.
    pub fn bind_framebuffer(
        &mut self,
        gl: &mut dyn GlApi,
        texture: Option<TextureId>,
        renderbuffer: Option<RenderbufferId>,
    ) -> Result<bool> {
        let target = match texture {
            Some(id) => {
                let tex = self.lookup(id)?;
                let Some(framebuffer) = tex.framebuffer else {
                    engine_bail!("portgfx::gl::Texture", InvalidHandle => "texture {:?} is not a render target", id);
                };
                Some((id, ColorTarget { framebuffer, texture_target: tex.target, texture_name: tex.native }))
            }
            None => None,
        };
        if let Some(rb) = renderbuffer {
            if self.framebuffers.renderbuffer(rb).is_none() {
                engine_bail!("portgfx::gl::Texture", InvalidHandle => "unknown renderbuffer {:?}", rb);
            }
        }

        if !self.capabilities.has_framebuffer_support {
            if target.is_none() && renderbuffer.is_none() {
                return Ok(false);
            }
            engine_bail!("portgfx::gl::Texture", CapabilityUnsupported => "framebuffer objects unavailable");
        }

        let live = target.filter(|(_, t)| t.texture_name != 0);
        let bound = self.framebuffers.bind(gl, live.map(|(_, t)| t), renderbuffer)?;
        if !bound {
            return Ok(false);
        }

        let Some((id, _)) = live else {
            return Ok(false);
        };
        let texture = self.lookup_mut(id)?;
        if !texture.needs_clear {
            return Ok(false);
        }
        texture.needs_clear = false;
        let alpha = if texture.has_alpha { 0.0 } else { 1.0 };
        gl.clear_color(0.0, 0.0, 0.0, alpha);
        gl.clear(GL_COLOR_BUFFER_BIT);
        Ok(true)
    }

    pub fn create_renderbuffer(&mut self, gl: &mut dyn GlApi, width: u32, height: u32) -> Result<RenderbufferId> {
        if !self.capabilities.has_framebuffer_support {
            engine_bail!("portgfx::gl::Texture", CapabilityUnsupported => "renderbuffers need framebuffer objects");
        }
        self.framebuffers.create_renderbuffer(gl, width, height)
    }

    pub fn release_renderbuffer(&mut self, gl: &mut dyn GlApi, id: RenderbufferId) -> Result<()> {
        self.framebuffers.release_renderbuffer(gl, id)
    }

    // ===== CONTEXT LOSS =====

    /// Delete every native object while keeping all keys valid
    ///
    /// Textures keep their logical size and reference count but have no
    /// native texture or framebuffer afterwards.
    pub fn clear_all_data(&mut self, gl: &mut dyn GlApi) {
        if self.capabilities.has_framebuffer_support {
            // Drops the bound references; cannot fail for the default target
            let _ = self.framebuffers.bind(gl, None, None);
        }
        for (_, texture) in self.textures.iter_mut() {
            if texture.native != 0 {
                gl.delete_texture(texture.native);
                texture.native = 0;
            }
            if let Some(fb) = texture.framebuffer.take() {
                self.framebuffers.release(gl, fb);
            }
        }
        self.framebuffers.clear_renderbuffer_natives(gl);
        self.framebuffers.clear_framebuffer_natives(gl);
        engine_debug!("portgfx::gl::Texture", "Cleared native data of {} textures", self.textures.len());
    }
}

/// Copy `rect` of an RGBA surface into the bound texture at the same position
fn upload_rect(gl: &mut dyn GlApi, target: GLenum, source: &Surface, rect: Rect) {
    const BPP: usize = 4;
    let pitch = source.pitch();
    let start = rect.y as usize * pitch + rect.x as usize * BPP;
    let row_bytes = rect.w as usize * BPP;
    let pixels = &source.pixels()[start..];

    gl.pixel_store_i(GL_UNPACK_ALIGNMENT, 1);
    if pitch == row_bytes {
        gl.tex_sub_image_2d(target, rect.x, rect.y, rect.w, rect.h, GL_RGBA, GL_UNSIGNED_BYTE, pixels);
    } else if gl.supports_unpack_row_length() && pitch % BPP == 0 {
        gl.pixel_store_i(GL_UNPACK_ROW_LENGTH, source.row_length() as GLint);
        gl.tex_sub_image_2d(target, rect.x, rect.y, rect.w, rect.h, GL_RGBA, GL_UNSIGNED_BYTE, pixels);
        gl.pixel_store_i(GL_UNPACK_ROW_LENGTH, 0);
    } else {
        let packed: Vec<u8> = pixels
            .chunks(pitch)
            .take(rect.h as usize)
            .flat_map(|row| &row[..row_bytes])
            .copied()
            .collect();
        gl.tex_sub_image_2d(target, rect.x, rect.y, rect.w, rect.h, GL_RGBA, GL_UNSIGNED_BYTE, &packed);
    }
}

#[cfg(test)]
#[path = "gl_texture_tests.rs"]
mod tests;
