/// GlRenderer - OpenGL implementation of the GraphicsBackend trait
///
/// Owns the native call seam and every piece of bound state: texture stages,
/// the preset engines (texture combiners and/or stock shader programs), the
/// caller's vertex/index buffers and the stream pool client data is copied
/// into before drawing on VBO contexts.

use std::ops::Range;
use glam::Vec4;
use portgfx::portgfx::graphics::{
    BlendEquation, BlendFactor, Bounds, Capabilities, ClearFlags, DepthFunc, DrawMode,
    GraphicsBackend, IndexBufferId, PresetProgramDesc, PrimitiveType, Rect, RenderbufferId,
    Surface, TextureId, TextureInfo, TextureReleaseCallback, VertexBufferId, VertexDefinition,
};
use portgfx::portgfx::Result;
use portgfx::{engine_bail, engine_err, engine_info, engine_warn};
use crate::gl_api::*;
use crate::gl_buffer::{BufferManager, StreamPool};
use crate::gl_context::GlProfile;
#[cfg(feature = "fixed-function")]
use crate::gl_fixed_function::{bind_client_arrays, unbind_client_arrays, FixedFunctionEngine};
use crate::gl_render_state::{self as state, depth_func_to_gl, primitive_to_gl, TextureStages};
use crate::gl_shader::ShaderEngine;
use crate::gl_texture::TextureManager;

const SOURCE: &str = "portgfx::gl::Renderer";

// ===== CONFIGURATION =====

/// Renderer creation options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlConfig {
    /// Flavour of the current context
    pub profile: GlProfile,
    /// Use the stock shader programs when the context supports them, even
    /// where texture combiners are available
    pub prefer_shaders: bool,
}

impl Default for GlConfig {
    fn default() -> Self {
        Self {
            profile: GlProfile::Desktop,
            prefer_shaders: true,
        }
    }
}

/// Which preset engine configured the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActiveProgram {
    None,
    #[cfg(feature = "fixed-function")]
    FixedFunction,
    Shader,
}

// ===== DRAW SUBMISSION =====

/// How vertex elements reach the pipeline
enum VertexPath<'a> {
    #[cfg(feature = "fixed-function")]
    ClientArrays,
    Attributes(&'a ShaderEngine),
}

enum Draw<'a> {
    Arrays { mode: GLenum, first: GLint, count: GLsizei },
    Elements { mode: GLenum, count: GLsizei, indices: IndexSource<'a> },
}

#[cfg_attr(not(feature = "fixed-function"), allow(unused_variables))]
fn vertex_path(
    active: ActiveProgram,
    fixed_function: bool,
    shaders: Option<&ShaderEngine>,
) -> Result<VertexPath<'_>> {
    match active {
        ActiveProgram::Shader => shaders
            .map(VertexPath::Attributes)
            .ok_or_else(|| engine_err!(SOURCE, "shader program active without a shader engine")),
        #[cfg(feature = "fixed-function")]
        ActiveProgram::FixedFunction => Ok(VertexPath::ClientArrays),
        ActiveProgram::None => {
            #[cfg(feature = "fixed-function")]
            {
                if fixed_function {
                    return Ok(VertexPath::ClientArrays);
                }
            }
            Err(engine_err!(SOURCE, "no preset program set; call set_preset_program before drawing"))
        }
    }
}

/// Bind the vertex layout, issue the draw, then disable the arrays again
///
/// # Safety
///
/// `vertices` and client indices in `draw` must cover every vertex and index
/// the draw reads.
unsafe fn submit(
    gl: &mut dyn GlApi,
    path: &VertexPath<'_>,
    definition: &VertexDefinition,
    vertices: Option<&[u8]>,
    draw: Draw<'_>,
) {
    match path {
        #[cfg(feature = "fixed-function")]
        VertexPath::ClientArrays => bind_client_arrays(gl, definition, vertices),
        VertexPath::Attributes(engine) => engine.bind_attributes(gl, definition, vertices),
    }
    match draw {
        Draw::Arrays { mode, first, count } => gl.draw_arrays(mode, first, count),
        Draw::Elements { mode, count, indices } => gl.draw_elements(mode, count, indices),
    }
    match path {
        #[cfg(feature = "fixed-function")]
        VertexPath::ClientArrays => unbind_client_arrays(gl, definition),
        VertexPath::Attributes(engine) => engine.unbind_attributes(gl, definition),
    }
}

fn check_vertex_range(definition: &VertexDefinition, range: &Range<usize>, available: usize) -> Result<()> {
    if !definition.is_consistent() {
        engine_bail!(SOURCE, "vertex definition does not fit its stride of {}", definition.stride);
    }
    if range.start > range.end || definition.byte_len(range.end) > available {
        engine_bail!(
            SOURCE,
            "vertex range {:?} exceeds {} bytes of vertex data",
            range,
            available
        );
    }
    Ok(())
}

fn check_index_range(range: &Range<usize>, available: usize) -> Result<()> {
    if range.start > range.end || range.end > available {
        engine_bail!(SOURCE, "index range {:?} exceeds {} indices", range, available);
    }
    Ok(())
}

/// Every index must address a vertex inside `vertex_range`
fn check_indices(indices: impl IntoIterator<Item = u16>, vertex_range: &Range<usize>) -> Result<()> {
    if let Some(bad) = indices.into_iter().find(|&i| !vertex_range.contains(&(i as usize))) {
        engine_bail!(SOURCE, "index {} outside vertex range {:?}", bad, vertex_range);
    }
    Ok(())
}

// ===== RENDERER =====

/// OpenGL backend
pub struct GlRenderer {
    /// Native entry points
    gl: Box<dyn GlApi>,
    config: GlConfig,
    capabilities: Capabilities,

    /// Textures, framebuffer pool and renderbuffers
    textures: TextureManager,
    /// Textures bound per stage
    stages: TextureStages,

    /// Texture-combiner presets (desktop contexts only)
    #[cfg(feature = "fixed-function")]
    fixed_function: Option<FixedFunctionEngine>,
    /// Stock shader programs (when the context supports them)
    shaders: Option<ShaderEngine>,
    active: ActiveProgram,

    buffers: BufferManager,
    stream: StreamPool,

    /// Last clear color set by the caller
    clear_color: Vec4,
    shut_down: bool,
}

impl GlRenderer {
    /// Create the renderer on a current GL context
    ///
    /// # Arguments
    ///
    /// * `gl` - entry points of the current context (`LoadedGl`, or `MockGl` headless)
    /// * `config` - profile and preset engine preference
    ///
    /// # Errors
    ///
    /// `InitializationFailed` when no preset engine can run on the context.
    pub fn new(gl: Box<dyn GlApi>, config: GlConfig) -> Result<Self> {
        let mut gl = gl;
        let capabilities = gl.capabilities();
        #[cfg_attr(not(feature = "fixed-function"), allow(unused_mut))]
        let mut textures = TextureManager::new(capabilities, config.profile);

        #[cfg(feature = "fixed-function")]
        let fixed_function = if config.profile == GlProfile::Desktop {
            let engine = FixedFunctionEngine::new(gl.as_mut(), &mut textures).map_err(|e| {
                engine_err!(SOURCE, InitializationFailed => "fixed-function engine failed: {}", e)
            })?;
            Some(engine)
        } else {
            None
        };
        #[cfg(feature = "fixed-function")]
        let has_fixed_function = fixed_function.is_some();
        #[cfg(not(feature = "fixed-function"))]
        let has_fixed_function = false;

        let shaders = if capabilities.has_shader_support && (config.prefer_shaders || !has_fixed_function) {
            let mut engine = ShaderEngine::new(config.profile == GlProfile::Desktop);
            engine.compile_stock(gl.as_mut());
            (engine.program_count() > 0).then_some(engine)
        } else {
            None
        };

        if !has_fixed_function && shaders.is_none() {
            engine_bail!(SOURCE, InitializationFailed => "no preset engine available for {:?}", config.profile);
        }

        let mut renderer = Self {
            gl,
            config,
            capabilities,
            textures,
            stages: TextureStages::new(),
            #[cfg(feature = "fixed-function")]
            fixed_function,
            shaders,
            active: ActiveProgram::None,
            buffers: BufferManager::new(capabilities.has_vbo_support),
            stream: StreamPool::new(),
            clear_color: Vec4::ZERO,
            shut_down: false,
        };

        renderer
            .set_preset_program(&PresetProgramDesc::default())
            .map_err(|e| engine_err!(SOURCE, InitializationFailed => "default preset failed: {}", e))?;

        engine_info!(
            SOURCE,
            "GL renderer ready ({:?}, {} presets, vbo={})",
            config.profile,
            if renderer.is_shader_active() { "shader" } else { "combiner" },
            capabilities.has_vbo_support
        );
        Ok(renderer)
    }

    pub fn config(&self) -> GlConfig {
        self.config
    }

    /// Whether the current preset runs on a shader program
    pub fn is_shader_active(&self) -> bool {
        self.active == ActiveProgram::Shader
    }

    #[cfg(feature = "fixed-function")]
    fn has_fixed_function(&self) -> bool {
        self.fixed_function.is_some()
    }

    #[cfg(not(feature = "fixed-function"))]
    fn has_fixed_function(&self) -> bool {
        false
    }

    /// Drain and record pending GL errors
    #[cfg(feature = "gl-debug")]
    fn check(&mut self, operation: &str) {
        crate::gl_debug::check_errors(self.gl.as_mut(), operation);
    }

    #[cfg(not(feature = "gl-debug"))]
    #[inline]
    fn check(&mut self, _operation: &str) {}

    fn live(&self) -> Result<()> {
        if self.shut_down {
            engine_bail!(SOURCE, "renderer has been shut down");
        }
        Ok(())
    }

    /// Unbind buffers a draw left bound so later client-array draws read memory
    fn reset_buffer_bindings(&mut self) {
        if self.buffers.uses_vbo() {
            self.gl.bind_buffer(GL_ARRAY_BUFFER, 0);
            self.gl.bind_buffer(GL_ELEMENT_ARRAY_BUFFER, 0);
        }
    }
}

impl GraphicsBackend for GlRenderer {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    // ===== BLENDING =====

    fn set_blend_mode(&mut self, equation: BlendEquation, src: BlendFactor, dst: BlendFactor) {
        state::set_blend_mode(self.gl.as_mut(), equation, src, dst);
        self.check("set_blend_mode");
    }

    fn set_blend_mode_separate(
        &mut self,
        equation: BlendEquation,
        src_rgb: BlendFactor,
        dst_rgb: BlendFactor,
        src_alpha: BlendFactor,
        dst_alpha: BlendFactor,
    ) {
        state::set_blend_mode_separate(self.gl.as_mut(), equation, src_rgb, dst_rgb, src_alpha, dst_alpha);
        self.check("set_blend_mode_separate");
    }

    fn disable_blend(&mut self) {
        self.gl.disable(GL_BLEND);
    }

    // ===== SCISSOR / CULLING / DEPTH =====

    fn set_scissor(&mut self, rect: Rect) {
        state::set_scissor(self.gl.as_mut(), rect);
    }

    fn set_scissor_bounds(&mut self, bounds: Option<Bounds>) {
        state::set_scissor_bounds(self.gl.as_mut(), bounds);
    }

    fn disable_scissor(&mut self) {
        self.gl.disable(GL_SCISSOR_TEST);
    }

    fn disable_culling(&mut self) {
        self.gl.disable(GL_CULL_FACE);
    }

    fn enable_depth_test(&mut self) {
        self.gl.enable(GL_DEPTH_TEST);
    }

    fn disable_depth_test(&mut self) {
        self.gl.disable(GL_DEPTH_TEST);
    }

    fn enable_depth_write(&mut self) {
        self.gl.depth_mask(true);
    }

    fn disable_depth_write(&mut self) {
        self.gl.depth_mask(false);
    }

    fn set_depth_func(&mut self, func: DepthFunc) {
        self.gl.depth_func(depth_func_to_gl(func));
    }

    // ===== VIEW / CLEAR / FRAME =====

    fn set_viewport(&mut self, rect: Rect) {
        self.gl.viewport(rect.x, rect.y, rect.w, rect.h);
        self.check("set_viewport");
    }

    fn set_z_range(&mut self, near: f32, far: f32) {
        self.gl.depth_range(near, far);
    }

    fn clear_color(&mut self, color: Vec4) {
        self.clear_color = color;
        self.gl.clear_color(color.x, color.y, color.z, color.w);
    }

    fn clear_depth(&mut self, depth: f32) {
        self.gl.clear_depth(depth);
    }

    fn clear(&mut self, flags: ClearFlags) {
        state::clear(self.gl.as_mut(), flags);
        self.check("clear");
    }

    fn finish(&mut self) {
        self.gl.finish();
    }

    fn start_frame(&mut self) -> Result<()> {
        self.live()
    }

    fn end_frame(&mut self) -> Result<()> {
        self.live()?;
        self.check("end_frame");
        Ok(())
    }

    // ===== TEXTURE STAGES / PRESETS =====

    fn set_texture_stage(&mut self, stage: usize, texture: Option<TextureId>, draw_mode: DrawMode) -> Result<()> {
        self.stages.set(self.gl.as_mut(), &mut self.textures, stage, texture, draw_mode)?;
        self.check("set_texture_stage");
        Ok(())
    }

    fn clear_textures(&mut self) {
        self.stages.clear(self.gl.as_mut(), &self.textures);
    }

    fn set_preset_program(&mut self, desc: &PresetProgramDesc) -> Result<()> {
        if let Some(id) = desc.texture {
            if self.textures.get(id).is_none() {
                engine_bail!(SOURCE, InvalidHandle => "unknown texture {:?}", id);
            }
        }
        let gl = self.gl.as_mut();

        if let Some(shaders) = self.shaders.as_mut().filter(|s| s.program_for(desc).is_some()) {
            #[cfg(feature = "fixed-function")]
            {
                if self.active == ActiveProgram::FixedFunction {
                    if let Some(engine) = self.fixed_function.as_mut() {
                        engine.clear(gl, &self.textures, &mut self.stages);
                    }
                }
            }
            self.active = ActiveProgram::None;
            shaders.apply(gl, &mut self.textures, &mut self.stages, desc)?;
            self.active = ActiveProgram::Shader;
            self.check("set_preset_program");
            return Ok(());
        }

        #[cfg(feature = "fixed-function")]
        {
            if let Some(engine) = self.fixed_function.as_mut() {
                if self.active == ActiveProgram::Shader {
                    if let Some(shaders) = self.shaders.as_mut() {
                        shaders.clear(gl, &self.textures, &mut self.stages);
                    }
                }
                self.active = ActiveProgram::None;
                engine.apply(gl, &mut self.textures, &mut self.stages, desc)?;
                self.active = ActiveProgram::FixedFunction;
                self.check("set_preset_program");
                return Ok(());
            }
        }

        engine_bail!(SOURCE, CapabilityUnsupported => "no program available for preset {:?}", desc.preset)
    }

    fn clear_preset_program(&mut self) {
        let gl = self.gl.as_mut();
        match self.active {
            #[cfg(feature = "fixed-function")]
            ActiveProgram::FixedFunction => {
                if let Some(engine) = self.fixed_function.as_mut() {
                    engine.clear(gl, &self.textures, &mut self.stages);
                }
            }
            ActiveProgram::Shader => {
                if let Some(shaders) = self.shaders.as_mut() {
                    shaders.clear(gl, &self.textures, &mut self.stages);
                }
            }
            ActiveProgram::None => self.stages.clear(gl, &self.textures),
        }
        self.active = ActiveProgram::None;
    }

    // ===== TEXTURES =====

    fn create_texture(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<TextureId> {
        let id = self.textures.create(self.gl.as_mut(), width, height, has_alpha)?;
        self.stages.rebind_active(self.gl.as_mut(), &mut self.textures);
        Ok(id)
    }

    fn create_texture_from_surface(&mut self, surface: &Surface, has_alpha: bool) -> Result<TextureId> {
        let id = self.textures.create_from_surface(self.gl.as_mut(), surface, has_alpha)?;
        self.stages.rebind_active(self.gl.as_mut(), &mut self.textures);
        Ok(id)
    }

    fn create_framebuffer_texture(&mut self, width: u32, height: u32, has_alpha: bool) -> Result<TextureId> {
        let id = self.textures.create_render_target(self.gl.as_mut(), width, height, has_alpha)?;
        self.stages.rebind_active(self.gl.as_mut(), &mut self.textures);
        Ok(id)
    }

    fn blit_surface(&mut self, texture: TextureId, surface: &Surface, rect: Option<Rect>) -> Result<()> {
        let result = self.textures.blit(self.gl.as_mut(), texture, surface, rect);
        self.stages.rebind_active(self.gl.as_mut(), &mut self.textures);
        self.check("blit_surface");
        result
    }

    fn texture_info(&self, texture: TextureId) -> Result<TextureInfo> {
        self.textures.info(texture)
    }

    fn set_texture_wrap(&mut self, texture: TextureId, wrap: bool) -> Result<()> {
        self.textures.set_wrap(self.gl.as_mut(), texture, wrap)?;
        self.stages.rebind_active(self.gl.as_mut(), &mut self.textures);
        Ok(())
    }

    fn texture_has_alpha(&self, texture: TextureId) -> bool {
        self.textures.has_alpha(texture)
    }

    fn set_texture_release_callback(&mut self, texture: TextureId, callback: TextureReleaseCallback) -> Result<()> {
        self.textures.set_release_callback(texture, callback)
    }

    fn texture_add_ref(&mut self, texture: TextureId) -> Result<()> {
        self.textures.add_ref(texture)
    }

    fn texture_release(&mut self, texture: TextureId) -> Result<()> {
        let last = self
            .textures
            .get(texture)
            .ok_or_else(|| engine_err!(SOURCE, InvalidHandle => "unknown texture {:?}", texture))?
            .ref_count
            == 1;
        if last {
            self.stages.unbind_texture(self.gl.as_mut(), &self.textures, texture);
        }
        self.textures.release(self.gl.as_mut(), texture)
    }

    fn bind_framebuffer(&mut self, texture: Option<TextureId>, renderbuffer: Option<RenderbufferId>) -> Result<()> {
        let cleared = self.textures.bind_framebuffer(self.gl.as_mut(), texture, renderbuffer)?;
        if cleared {
            let c = self.clear_color;
            self.gl.clear_color(c.x, c.y, c.z, c.w);
        }
        self.check("bind_framebuffer");
        Ok(())
    }

    fn create_renderbuffer(&mut self, width: u32, height: u32) -> Result<RenderbufferId> {
        self.textures.create_renderbuffer(self.gl.as_mut(), width, height)
    }

    fn release_renderbuffer(&mut self, renderbuffer: RenderbufferId) -> Result<()> {
        self.textures.release_renderbuffer(self.gl.as_mut(), renderbuffer)
    }

    fn read_framebuffer(&mut self, rect: Rect) -> Result<Surface> {
        self.textures.read_framebuffer(self.gl.as_mut(), rect)
    }

    fn clear_all_data(&mut self) {
        self.stages.clear(self.gl.as_mut(), &self.textures);
        self.textures.clear_all_data(self.gl.as_mut());
        engine_info!(SOURCE, "native texture data cleared ({} handles kept)", self.textures.len());
    }

    // ===== BUFFERS =====

    fn create_vertex_buffer(
        &mut self,
        stride: usize,
        data: Option<&[u8]>,
        vertex_count: usize,
        is_static: bool,
    ) -> Result<VertexBufferId> {
        self.buffers.create_vertex_buffer(self.gl.as_mut(), stride, data, vertex_count, is_static)
    }

    fn vertex_buffer_set_data(
        &mut self,
        buffer: VertexBufferId,
        data: &[u8],
        start: usize,
        count: usize,
        reset: bool,
    ) -> Result<()> {
        let result = self.buffers.vertex_buffer_set_data(self.gl.as_mut(), buffer, data, start, count, reset);
        self.reset_buffer_bindings();
        result
    }

    fn delete_vertex_buffer(&mut self, buffer: VertexBufferId) -> Result<()> {
        self.buffers.delete_vertex_buffer(self.gl.as_mut(), buffer)
    }

    fn create_index_buffer(&mut self, data: Option<&[u16]>, index_count: usize, is_static: bool) -> Result<IndexBufferId> {
        self.buffers.create_index_buffer(self.gl.as_mut(), data, index_count, is_static)
    }

    fn index_buffer_set_data(
        &mut self,
        buffer: IndexBufferId,
        data: &[u16],
        start: usize,
        count: usize,
        reset: bool,
    ) -> Result<()> {
        let result = self.buffers.index_buffer_set_data(self.gl.as_mut(), buffer, data, start, count, reset);
        self.reset_buffer_bindings();
        result
    }

    fn delete_index_buffer(&mut self, buffer: IndexBufferId) -> Result<()> {
        self.buffers.delete_index_buffer(self.gl.as_mut(), buffer)
    }

    // ===== DRAWING =====

    fn draw_vertex_array(
        &mut self,
        def: &VertexDefinition,
        vertices: &[u8],
        primitive: PrimitiveType,
        vertex_range: Range<usize>,
    ) -> Result<()> {
        self.live()?;
        check_vertex_range(def, &vertex_range, vertices.len())?;
        if vertex_range.is_empty() {
            return Ok(());
        }
        let path = vertex_path(self.active, self.has_fixed_function(), self.shaders.as_ref())?;
        let mode = primitive_to_gl(primitive);
        let count = vertex_range.len() as GLsizei;

        if self.buffers.uses_vbo() {
            let bytes = &vertices[def.byte_len(vertex_range.start)..def.byte_len(vertex_range.end)];
            self.stream.stream_vertices(self.gl.as_mut(), bytes, 0)?;
            unsafe {
                submit(self.gl.as_mut(), &path, def, None, Draw::Arrays { mode, first: 0, count });
            }
        } else {
            let first = vertex_range.start as GLint;
            unsafe {
                submit(self.gl.as_mut(), &path, def, Some(vertices), Draw::Arrays { mode, first, count });
            }
        }
        self.reset_buffer_bindings();
        self.check("draw_vertex_array");
        Ok(())
    }

    fn draw_vertex_index_array(
        &mut self,
        def: &VertexDefinition,
        vertices: &[u8],
        vertex_range: Range<usize>,
        indices: &[u16],
        primitive: PrimitiveType,
        index_range: Range<usize>,
    ) -> Result<()> {
        self.live()?;
        check_vertex_range(def, &vertex_range, vertices.len())?;
        check_index_range(&index_range, indices.len())?;
        if index_range.is_empty() {
            return Ok(());
        }
        let indices = &indices[index_range];
        check_indices(indices.iter().copied(), &vertex_range)?;
        let path = vertex_path(self.active, self.has_fixed_function(), self.shaders.as_ref())?;
        let mode = primitive_to_gl(primitive);
        let count = indices.len() as GLsizei;

        if self.buffers.uses_vbo() {
            // Streamed at their own offset so indices keep addressing absolute vertices
            let start = def.byte_len(vertex_range.start);
            let bytes = &vertices[start..def.byte_len(vertex_range.end)];
            self.stream.stream_vertices(self.gl.as_mut(), bytes, start)?;
            self.stream.stream_indices(self.gl.as_mut(), indices)?;
            unsafe {
                submit(
                    self.gl.as_mut(),
                    &path,
                    def,
                    None,
                    Draw::Elements { mode, count, indices: IndexSource::Offset(0) },
                );
            }
        } else {
            unsafe {
                submit(
                    self.gl.as_mut(),
                    &path,
                    def,
                    Some(vertices),
                    Draw::Elements { mode, count, indices: IndexSource::Client(indices) },
                );
            }
        }
        self.reset_buffer_bindings();
        self.check("draw_vertex_index_array");
        Ok(())
    }

    fn draw_vertex_buffer(
        &mut self,
        def: &VertexDefinition,
        buffer: VertexBufferId,
        primitive: PrimitiveType,
        vertex_range: Range<usize>,
    ) -> Result<()> {
        self.live()?;
        let vb = self
            .buffers
            .vertex_buffer(buffer)
            .ok_or_else(|| engine_err!(SOURCE, InvalidHandle => "unknown vertex buffer {:?}", buffer))?;
        check_vertex_range(def, &vertex_range, vb.size)?;
        if vertex_range.is_empty() {
            return Ok(());
        }
        let path = vertex_path(self.active, self.has_fixed_function(), self.shaders.as_ref())?;
        let draw = Draw::Arrays {
            mode: primitive_to_gl(primitive),
            first: vertex_range.start as GLint,
            count: vertex_range.len() as GLsizei,
        };

        if vb.native != 0 {
            self.gl.bind_buffer(GL_ARRAY_BUFFER, vb.native);
            unsafe { submit(self.gl.as_mut(), &path, def, None, draw) };
        } else {
            unsafe { submit(self.gl.as_mut(), &path, def, Some(vb.fallback.as_slice()), draw) };
        }
        self.reset_buffer_bindings();
        self.check("draw_vertex_buffer");
        Ok(())
    }

    fn draw_vertex_index_buffer(
        &mut self,
        def: &VertexDefinition,
        vertex_buffer: VertexBufferId,
        vertex_range: Range<usize>,
        index_buffer: IndexBufferId,
        primitive: PrimitiveType,
        index_range: Range<usize>,
    ) -> Result<()> {
        self.live()?;
        let vb = self
            .buffers
            .vertex_buffer(vertex_buffer)
            .ok_or_else(|| engine_err!(SOURCE, InvalidHandle => "unknown vertex buffer {:?}", vertex_buffer))?;
        let ib = self
            .buffers
            .index_buffer(index_buffer)
            .ok_or_else(|| engine_err!(SOURCE, InvalidHandle => "unknown index buffer {:?}", index_buffer))?;
        check_vertex_range(def, &vertex_range, vb.size)?;
        check_index_range(&index_range, ib.size / 2)?;
        if index_range.is_empty() {
            return Ok(());
        }
        let path = vertex_path(self.active, self.has_fixed_function(), self.shaders.as_ref())?;
        let mode = primitive_to_gl(primitive);
        let count = index_range.len() as GLsizei;

        if vb.native != 0 && ib.native != 0 {
            self.gl.bind_buffer(GL_ARRAY_BUFFER, vb.native);
            self.gl.bind_buffer(GL_ELEMENT_ARRAY_BUFFER, ib.native);
            let indices = IndexSource::Offset(index_range.start * 2);
            unsafe { submit(self.gl.as_mut(), &path, def, None, Draw::Elements { mode, count, indices }) };
        } else {
            let indices: Vec<u16> = ib.fallback[index_range.start * 2..index_range.end * 2]
                .chunks_exact(2)
                .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                .collect();
            check_indices(indices.iter().copied(), &vertex_range)?;
            let draw = Draw::Elements { mode, count, indices: IndexSource::Client(&indices) };
            unsafe { submit(self.gl.as_mut(), &path, def, Some(vb.fallback.as_slice()), draw) };
        }
        self.reset_buffer_bindings();
        self.check("draw_vertex_index_buffer");
        Ok(())
    }

    // ===== LIFECYCLE =====

    fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        let gl = self.gl.as_mut();
        if let Some(shaders) = self.shaders.as_mut() {
            shaders.cleanup(gl);
        }
        #[cfg(feature = "fixed-function")]
        {
            if let Some(engine) = self.fixed_function.as_mut() {
                engine.clear(gl, &self.textures, &mut self.stages);
                engine.cleanup(gl, &mut self.textures);
            }
        }
        self.active = ActiveProgram::None;
        self.stream.cleanup(gl);
        self.buffers.cleanup(gl);
        self.clear_all_data();
        if self.textures.len() > 0 {
            engine_warn!(SOURCE, "{} textures still referenced at shutdown", self.textures.len());
        }
        self.shut_down = true;
        engine_info!(SOURCE, "GL renderer shut down");
    }
}

impl Drop for GlRenderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
#[path = "gl_renderer_tests.rs"]
mod tests;
