/// GraphicsBackend trait - the dispatch table every backend implements
///
/// The upper drawing layer talks only to this trait and never branches on
/// which backend is active. All calls are synchronous and must be made on the
/// thread that owns the native context; state setters affect the draw calls
/// that follow them and nothing is deferred.

use std::ops::Range;
use glam::Vec4;
use crate::error::Result;
use crate::graphics::preset::PresetProgramDesc;
use crate::graphics::state::{
    BlendEquation, BlendFactor, Bounds, ClearFlags, DepthFunc, PrimitiveType, Rect,
};
use crate::graphics::surface::Surface;
use crate::graphics::texture::{
    DrawMode, IndexBufferId, RenderbufferId, TextureId, TextureInfo, TextureReleaseCallback,
    VertexBufferId,
};
use crate::graphics::vertex::VertexDefinition;

/// Maximum number of texture stages a backend exposes
pub const MAX_TEXTURE_STAGES: usize = 4;

/// Runtime capability flags detected when the backend was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub has_framebuffer_support: bool,
    pub has_npt_support: bool,
    pub has_texture_rectangle_support: bool,
    pub has_vbo_support: bool,
    pub has_shader_support: bool,
    pub max_texture_width: u32,
    pub max_texture_height: u32,
}

/// Backend-neutral graphics operations
pub trait GraphicsBackend: Send {
    /// Capability flags of the active context
    fn capabilities(&self) -> Capabilities;

    // ===== BLENDING =====

    /// Set blend equation and factors (`BlendEquation::Disable` turns blending off)
    fn set_blend_mode(&mut self, equation: BlendEquation, src: BlendFactor, dst: BlendFactor);

    /// Same as `set_blend_mode` with separate RGB and alpha factors
    fn set_blend_mode_separate(
        &mut self,
        equation: BlendEquation,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    );

    fn disable_blend(&mut self);

    // ===== SCISSOR / CULLING / DEPTH =====

    /// Enable scissoring to an x/y/w/h rectangle
    fn set_scissor(&mut self, rect: Rect);

    /// Enable scissoring to left/top/right/bottom bounds, or disable it with `None`
    fn set_scissor_bounds(&mut self, bounds: Option<Bounds>);

    fn disable_scissor(&mut self);

    fn disable_culling(&mut self);

    fn enable_depth_test(&mut self);

    fn disable_depth_test(&mut self);

    fn enable_depth_write(&mut self);

    fn disable_depth_write(&mut self);

    fn set_depth_func(&mut self, func: DepthFunc);

    // ===== VIEW / CLEAR / FRAME =====

    fn set_viewport(&mut self, rect: Rect);

    fn set_z_range(&mut self, near: f32, far: f32);

    fn clear_color(&mut self, color: Vec4);

    fn clear_depth(&mut self, depth: f32);

    /// Clear the selected buffers; also resets the depth function to less-or-equal
    fn clear(&mut self, flags: ClearFlags);

    fn finish(&mut self);

    fn start_frame(&mut self) -> Result<()>;

    fn end_frame(&mut self) -> Result<()>;

    // ===== TEXTURE STAGES / PRESETS =====

    /// Bind a texture (or nothing) to a stage below `MAX_TEXTURE_STAGES`
    fn set_texture_stage(
        &mut self,
        stage: usize,
        texture: Option<TextureId>,
        draw_mode: DrawMode,
    ) -> Result<()>;

    /// Unbind every stage bound since the last clear
    fn clear_textures(&mut self);

    /// Select a preset program with its matrices, texture and alpha test
    fn set_preset_program(&mut self, desc: &PresetProgramDesc) -> Result<()>;

    /// Back to neutral modulate state with no texture bound
    fn clear_preset_program(&mut self);

    // ===== TEXTURES =====

    /// Create an uninitialized texture; the caller holds the only reference
    fn create_texture(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<TextureId>;

    /// Create a texture sized to `surface` and upload it
    fn create_texture_from_surface(&mut self, surface: &Surface, has_alpha: bool) -> Result<TextureId>;

    /// Create a texture usable as a render target
    fn create_framebuffer_texture(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<TextureId>;

    /// Upload `rect` of `surface` (whole surface for `None`) at the same offset
    fn blit_surface(&mut self, texture: TextureId, surface: &Surface, rect: Option<Rect>) -> Result<()>;

    fn texture_info(&self, texture: TextureId) -> Result<TextureInfo>;

    /// Repeat addressing when `wrap` is set and the texture is wrappable,
    /// clamp-to-edge otherwise
    fn set_texture_wrap(&mut self, texture: TextureId, wrap: bool) -> Result<()>;

    /// False for unknown textures
    fn texture_has_alpha(&self, texture: TextureId) -> bool;

    fn set_texture_release_callback(
        &mut self,
        texture: TextureId,
        callback: TextureReleaseCallback,
    ) -> Result<()>;

    fn texture_add_ref(&mut self, texture: TextureId) -> Result<()>;

    /// Drop one reference; the last one destroys the texture
    fn texture_release(&mut self, texture: TextureId) -> Result<()>;

    /// Render into a framebuffer texture (`None` restores the default target)
    fn bind_framebuffer(
        &mut self,
        texture: Option<TextureId>,
        renderbuffer: Option<RenderbufferId>,
    ) -> Result<()>;

    /// Create a depth-stencil renderbuffer
    fn create_renderbuffer(&mut self, width: u32, height: u32) -> Result<RenderbufferId>;

    fn release_renderbuffer(&mut self, renderbuffer: RenderbufferId) -> Result<()>;

    /// Read back RGBA pixels of the bound target
    fn read_framebuffer(&mut self, rect: Rect) -> Result<Surface>;

    /// Destroy every native texture, framebuffer and renderbuffer while keeping
    /// the keys (context loss)
    fn clear_all_data(&mut self);

    // ===== BUFFERS =====

    fn create_vertex_buffer(
        &mut self,
        stride: usize,
        data: Option<&[u8]>,
        vertex_count: usize,
        is_static: bool,
    ) -> Result<VertexBufferId>;

    /// Write `count` vertices at vertex index `start`
    fn vertex_buffer_set_data(
        &mut self,
        buffer: VertexBufferId,
        data: &[u8],
        start: usize,
        count: usize,
        reset: bool,
    ) -> Result<()>;

    fn delete_vertex_buffer(&mut self, buffer: VertexBufferId) -> Result<()>;

    fn create_index_buffer(
        &mut self,
        data: Option<&[u16]>,
        index_count: usize,
        is_static: bool,
    ) -> Result<IndexBufferId>;

    /// Write `count` indices at index `start`
    fn index_buffer_set_data(
        &mut self,
        buffer: IndexBufferId,
        data: &[u16],
        start: usize,
        count: usize,
        reset: bool,
    ) -> Result<()>;

    fn delete_index_buffer(&mut self, buffer: IndexBufferId) -> Result<()>;

    // ===== DRAWING =====

    /// Draw `vertices` (vertex range in vertex units) from client memory
    fn draw_vertex_array(
        &mut self,
        def: &VertexDefinition,
        vertices: &[u8],
        primitive: PrimitiveType,
        vertex_range: Range<usize>,
    ) -> Result<()>;

    /// Indexed draw from client memory
    fn draw_vertex_index_array(
        &mut self,
        def: &VertexDefinition,
        vertices: &[u8],
        vertex_range: Range<usize>,
        indices: &[u16],
        primitive: PrimitiveType,
        index_range: Range<usize>,
    ) -> Result<()>;

    fn draw_vertex_buffer(
        &mut self,
        def: &VertexDefinition,
        buffer: VertexBufferId,
        primitive: PrimitiveType,
        vertex_range: Range<usize>,
    ) -> Result<()>;

    fn draw_vertex_index_buffer(
        &mut self,
        def: &VertexDefinition,
        vertex_buffer: VertexBufferId,
        vertex_range: Range<usize>,
        index_buffer: IndexBufferId,
        primitive: PrimitiveType,
        index_range: Range<usize>,
    ) -> Result<()>;

    // ===== LIFECYCLE =====

    /// Engine cleanup followed by `clear_all_data`; safe to call twice
    fn shutdown(&mut self);
}
