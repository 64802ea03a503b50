/// Mock backend for unit tests (no GPU required)
///
/// Records every call as a string and keeps just enough resource bookkeeping
/// (reference counts, sizes) for Engine-level tests.

use std::ops::Range;
use std::sync::{Arc, Mutex};
use glam::Vec4;
use slotmap::SlotMap;

use crate::engine_bail;
use crate::error::Result;
use crate::graphics::{
    BlendEquation, BlendFactor, Bounds, Capabilities, ClearFlags, DepthFunc, DrawMode,
    GraphicsBackend, IndexBufferId, PixelFormat, PresetProgramDesc, PrimitiveType, Rect,
    RenderbufferId, Surface, TextureId, TextureInfo, TextureReleaseCallback, VertexBufferId,
    VertexDefinition,
};

pub struct MockTexture {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub ref_count: u32,
    pub callback: Option<TextureReleaseCallback>,
}

pub struct MockBackend {
    pub commands: Arc<Mutex<Vec<String>>>,
    pub textures: SlotMap<TextureId, MockTexture>,
    pub renderbuffers: SlotMap<RenderbufferId, (u32, u32)>,
    pub vertex_buffers: SlotMap<VertexBufferId, usize>,
    pub index_buffers: SlotMap<IndexBufferId, usize>,
    pub shut_down: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            commands: Arc::new(Mutex::new(Vec::new())),
            textures: SlotMap::with_key(),
            renderbuffers: SlotMap::with_key(),
            vertex_buffers: SlotMap::with_key(),
            index_buffers: SlotMap::with_key(),
            shut_down: false,
        }
    }

    /// Shared handle on the command log (stays valid after the backend moves
    /// into the Engine)
    pub fn command_log(&self) -> Arc<Mutex<Vec<String>>> {
        self.commands.clone()
    }

    fn record(&self, command: String) {
        self.commands.lock().unwrap().push(command);
    }

    fn texture(&self, texture: TextureId) -> Result<&MockTexture> {
        match self.textures.get(texture) {
            Some(t) => Ok(t),
            None => engine_bail!("portgfx::mock", InvalidHandle => "unknown texture {:?}", texture),
        }
    }
}

impl GraphicsBackend for MockBackend {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            has_framebuffer_support: true,
            has_npt_support: true,
            has_texture_rectangle_support: false,
            has_vbo_support: true,
            has_shader_support: false,
            max_texture_width: 2048,
            max_texture_height: 2048,
        }
    }

    fn set_blend_mode(&mut self, equation: BlendEquation, src: BlendFactor, dst: BlendFactor) {
        self.record(format!("set_blend_mode {:?} {:?} {:?}", equation, src, dst));
    }

    fn set_blend_mode_separate(
        &mut self,
        equation: BlendEquation,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        self.record(format!(
            "set_blend_mode_separate {:?} {:?} {:?} {:?} {:?}",
            equation, src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
    }

    fn disable_blend(&mut self) {
        self.record("disable_blend".to_string());
    }

    fn set_scissor(&mut self, rect: Rect) {
        self.record(format!("set_scissor {:?}", rect));
    }

    fn set_scissor_bounds(&mut self, bounds: Option<Bounds>) {
        match bounds {
            Some(b) => self.set_scissor(b.to_rect()),
            None => self.disable_scissor(),
        }
    }

    fn disable_scissor(&mut self) {
        self.record("disable_scissor".to_string());
    }

    fn disable_culling(&mut self) {
        self.record("disable_culling".to_string());
    }

    fn enable_depth_test(&mut self) {
        self.record("enable_depth_test".to_string());
    }

    fn disable_depth_test(&mut self) {
        self.record("disable_depth_test".to_string());
    }

    fn enable_depth_write(&mut self) {
        self.record("enable_depth_write".to_string());
    }

    fn disable_depth_write(&mut self) {
        self.record("disable_depth_write".to_string());
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.record(format!("set_depth_func {:?}", func));
    }

    fn set_viewport(&mut self, rect: Rect) {
        self.record(format!("set_viewport {:?}", rect));
    }

    fn set_z_range(&mut self, near: f32, far: f32) {
        self.record(format!("set_z_range {} {}", near, far));
    }

    fn clear_color(&mut self, color: Vec4) {
        self.record(format!("clear_color {:?}", color.to_array()));
    }

    fn clear_depth(&mut self, depth: f32) {
        self.record(format!("clear_depth {}", depth));
    }

    fn clear(&mut self, flags: ClearFlags) {
        self.record(format!("clear {:?}", flags));
    }

    fn finish(&mut self) {
        self.record("finish".to_string());
    }

    fn start_frame(&mut self) -> Result<()> {
        self.record("start_frame".to_string());
        Ok(())
    }

    fn end_frame(&mut self) -> Result<()> {
        self.record("end_frame".to_string());
        Ok(())
    }

    fn set_texture_stage(&mut self, stage: usize, texture: Option<TextureId>, draw_mode: DrawMode) -> Result<()> {
        if stage >= crate::graphics::MAX_TEXTURE_STAGES {
            engine_bail!("portgfx::mock", "stage {} out of range", stage);
        }
        self.record(format!("set_texture_stage {} {:?} {:?}", stage, texture, draw_mode));
        Ok(())
    }

    fn clear_textures(&mut self) {
        self.record("clear_textures".to_string());
    }

    fn set_preset_program(&mut self, desc: &PresetProgramDesc) -> Result<()> {
        self.record(format!("set_preset_program {:?} textured={}", desc.preset, desc.texture.is_some()));
        Ok(())
    }

    fn clear_preset_program(&mut self) {
        self.record("clear_preset_program".to_string());
    }

    fn create_texture(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<TextureId> {
        self.record(format!("create_texture {}x{}", width, height));
        Ok(self.textures.insert(MockTexture { width, height, has_alpha, ref_count: 1, callback: None }))
    }

    fn create_texture_from_surface(&mut self, surface: &Surface, has_alpha: bool) -> Result<TextureId> {
        let has_alpha = has_alpha || surface.color_key().is_some();
        self.create_texture(surface.width(), surface.height(), has_alpha)
    }

    fn create_framebuffer_texture(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<TextureId> {
        self.create_texture(width, height, has_alpha)
    }

    fn blit_surface(&mut self, texture: TextureId, _surface: &Surface, rect: Option<Rect>) -> Result<()> {
        self.texture(texture)?;
        self.record(format!("blit_surface {:?}", rect));
        Ok(())
    }

    fn texture_info(&self, texture: TextureId) -> Result<TextureInfo> {
        let t = self.texture(texture)?;
        Ok(TextureInfo {
            width: t.width,
            height: t.height,
            width_mult: 1.0 / t.width as f32,
            height_mult: 1.0 / t.height as f32,
        })
    }

    fn set_texture_wrap(&mut self, texture: TextureId, wrap: bool) -> Result<()> {
        self.texture(texture)?;
        self.record(format!("set_texture_wrap {}", wrap));
        Ok(())
    }

    fn texture_has_alpha(&self, texture: TextureId) -> bool {
        self.textures.get(texture).map(|t| t.has_alpha).unwrap_or(false)
    }

    fn set_texture_release_callback(&mut self, texture: TextureId, callback: TextureReleaseCallback) -> Result<()> {
        match self.textures.get_mut(texture) {
            Some(t) => {
                t.callback = Some(callback);
                Ok(())
            }
            None => engine_bail!("portgfx::mock", InvalidHandle => "unknown texture"),
        }
    }

    fn texture_add_ref(&mut self, texture: TextureId) -> Result<()> {
        match self.textures.get_mut(texture) {
            Some(t) => {
                t.ref_count += 1;
                Ok(())
            }
            None => engine_bail!("portgfx::mock", InvalidHandle => "unknown texture"),
        }
    }

    fn texture_release(&mut self, texture: TextureId) -> Result<()> {
        let Some(t) = self.textures.get_mut(texture) else {
            engine_bail!("portgfx::mock", InvalidHandle => "unknown texture");
        };
        t.ref_count -= 1;
        if t.ref_count == 0 {
            if let Some(mut t) = self.textures.remove(texture) {
                if let Some(callback) = t.callback.as_mut() {
                    callback(texture);
                }
            }
            self.record("delete_texture".to_string());
        }
        Ok(())
    }

    fn bind_framebuffer(&mut self, texture: Option<TextureId>, _renderbuffer: Option<RenderbufferId>) -> Result<()> {
        if let Some(texture) = texture {
            self.texture(texture)?;
        }
        self.record(format!("bind_framebuffer {:?}", texture.is_some()));
        Ok(())
    }

    fn create_renderbuffer(&mut self, width: u32, height: u32) -> Result<RenderbufferId> {
        Ok(self.renderbuffers.insert((width, height)))
    }

    fn release_renderbuffer(&mut self, renderbuffer: RenderbufferId) -> Result<()> {
        match self.renderbuffers.remove(renderbuffer) {
            Some(_) => Ok(()),
            None => engine_bail!("portgfx::mock", InvalidHandle => "unknown renderbuffer"),
        }
    }

    fn read_framebuffer(&mut self, rect: Rect) -> Result<Surface> {
        Ok(Surface::new(rect.w.max(0) as u32, rect.h.max(0) as u32, PixelFormat::Rgba8888))
    }

    fn clear_all_data(&mut self) {
        self.record("clear_all_data".to_string());
    }

    fn create_vertex_buffer(&mut self, stride: usize, _data: Option<&[u8]>, vertex_count: usize, _is_static: bool) -> Result<VertexBufferId> {
        Ok(self.vertex_buffers.insert(stride * vertex_count))
    }

    fn vertex_buffer_set_data(&mut self, buffer: VertexBufferId, _data: &[u8], _start: usize, _count: usize, _reset: bool) -> Result<()> {
        if !self.vertex_buffers.contains_key(buffer) {
            engine_bail!("portgfx::mock", InvalidHandle => "unknown vertex buffer");
        }
        Ok(())
    }

    fn delete_vertex_buffer(&mut self, buffer: VertexBufferId) -> Result<()> {
        self.vertex_buffers.remove(buffer);
        Ok(())
    }

    fn create_index_buffer(&mut self, _data: Option<&[u16]>, index_count: usize, _is_static: bool) -> Result<IndexBufferId> {
        Ok(self.index_buffers.insert(index_count))
    }

    fn index_buffer_set_data(&mut self, buffer: IndexBufferId, _data: &[u16], _start: usize, _count: usize, _reset: bool) -> Result<()> {
        if !self.index_buffers.contains_key(buffer) {
            engine_bail!("portgfx::mock", InvalidHandle => "unknown index buffer");
        }
        Ok(())
    }

    fn delete_index_buffer(&mut self, buffer: IndexBufferId) -> Result<()> {
        self.index_buffers.remove(buffer);
        Ok(())
    }

    fn draw_vertex_array(&mut self, _def: &VertexDefinition, _vertices: &[u8], primitive: PrimitiveType, vertex_range: Range<usize>) -> Result<()> {
        self.record(format!("draw_vertex_array {:?} {:?}", primitive, vertex_range));
        Ok(())
    }

    fn draw_vertex_index_array(&mut self, _def: &VertexDefinition, _vertices: &[u8], _vertex_range: Range<usize>, _indices: &[u16], primitive: PrimitiveType, index_range: Range<usize>) -> Result<()> {
        self.record(format!("draw_vertex_index_array {:?} {:?}", primitive, index_range));
        Ok(())
    }

    fn draw_vertex_buffer(&mut self, _def: &VertexDefinition, _buffer: VertexBufferId, primitive: PrimitiveType, vertex_range: Range<usize>) -> Result<()> {
        self.record(format!("draw_vertex_buffer {:?} {:?}", primitive, vertex_range));
        Ok(())
    }

    fn draw_vertex_index_buffer(&mut self, _def: &VertexDefinition, _vertex_buffer: VertexBufferId, _vertex_range: Range<usize>, _index_buffer: IndexBufferId, primitive: PrimitiveType, index_range: Range<usize>) -> Result<()> {
        self.record(format!("draw_vertex_index_buffer {:?} {:?}", primitive, index_range));
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.record("shutdown".to_string());
    }
}

#[cfg(test)]
#[path = "mock_backend_tests.rs"]
mod tests;
