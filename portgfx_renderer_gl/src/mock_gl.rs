/// MockGl - GlApi implementation without a driver
///
/// Simulates the parts of a GL context the backend relies on: object
/// namespaces with lowest-free name reuse, per-unit texture bindings and
/// texture environment, enabled capabilities, client arrays, buffer storage,
/// framebuffer completeness, shader compilation and linking, plus a string log
/// of every call. Failures can be injected per call name.
///
/// Clones share the same state, so a test keeps one clone while the renderer
/// owns another.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use portgfx::portgfx::graphics::Capabilities;
use crate::gl_api::*;

/// Texture object as the mock sees it
#[derive(Debug, Clone, Default)]
pub struct MockTexture {
    pub target: GLenum,
    pub width: GLsizei,
    pub height: GLsizei,
    /// R, G, B, A bytes, tightly packed
    pub pixels: Vec<u8>,
    pub params: BTreeMap<GLenum, GLint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockFramebuffer {
    pub color: Option<GLuint>,
    pub depth: Option<GLuint>,
    pub stencil: Option<GLuint>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockRenderbuffer {
    pub internal_format: GLenum,
    pub width: GLsizei,
    pub height: GLsizei,
}

#[derive(Debug, Clone, Default)]
pub struct MockBuffer {
    pub data: Vec<u8>,
    pub usage: GLenum,
}

#[derive(Debug, Clone, Default)]
pub struct MockShader {
    pub ty: GLenum,
    pub source: String,
    pub compiled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MockProgram {
    pub shaders: Vec<GLuint>,
    pub linked: bool,
    pub attributes: Vec<String>,
    pub uniforms: Vec<String>,
}

/// One recorded draw call
#[derive(Debug, Clone, PartialEq)]
pub struct MockDraw {
    pub mode: GLenum,
    pub first: GLint,
    pub count: GLsizei,
    /// Client indices for client-side indexed draws
    pub client_indices: Option<Vec<u16>>,
    /// Byte offset into the element buffer for buffer-backed indexed draws
    pub index_offset: Option<usize>,
    pub array_buffer: GLuint,
    pub element_buffer: GLuint,
    pub program: GLuint,
    /// Client arrays (array, client unit) enabled when the draw was issued
    pub client_arrays: Vec<(GLenum, u32)>,
    /// Generic attribute arrays enabled when the draw was issued
    pub attrib_arrays: Vec<GLuint>,
}

/// Whole simulated context
#[derive(Debug, Default)]
pub struct MockGlState {
    pub capabilities: Capabilities,
    pub fixed_function: bool,
    pub unpack_row_length: bool,

    pub calls: Vec<String>,
    pub errors: Vec<GLenum>,
    pending_failures: Vec<(String, GLenum)>,
    pub compile_failures: bool,
    pub forced_framebuffer_status: Option<GLenum>,

    pub textures: BTreeMap<GLuint, MockTexture>,
    pub framebuffers: BTreeMap<GLuint, MockFramebuffer>,
    pub renderbuffers: BTreeMap<GLuint, MockRenderbuffer>,
    pub buffers: BTreeMap<GLuint, MockBuffer>,
    pub shaders: BTreeMap<GLuint, MockShader>,
    pub programs: BTreeMap<GLuint, MockProgram>,

    pub active_unit: u32,
    pub client_active_unit: u32,
    /// (unit, target) -> texture
    pub bound_textures: BTreeMap<(u32, GLenum), GLuint>,
    /// (unit, pname) -> value for `GL_TEXTURE_ENV`
    pub tex_env: BTreeMap<(u32, GLenum), GLint>,
    /// (cap, unit); the unit is 0 for everything but texture targets
    pub enabled: BTreeSet<(GLenum, u32)>,
    /// (array, client unit)
    pub client_arrays: BTreeSet<(GLenum, u32)>,
    pub attrib_arrays: BTreeSet<GLuint>,

    pub bound_framebuffer: GLuint,
    pub bound_renderbuffer: GLuint,
    pub bound_array_buffer: GLuint,
    pub bound_element_buffer: GLuint,
    pub current_program: GLuint,

    pub matrix_mode: GLenum,
    pub matrices: BTreeMap<GLenum, [f32; 16]>,
    pub alpha_func: Option<(GLenum, f32)>,
    pub blend_func: Option<(GLenum, GLenum, GLenum, GLenum)>,
    pub blend_equation: Option<GLenum>,
    pub depth_func: Option<GLenum>,
    pub depth_mask: bool,
    pub depth_range: Option<(f32, f32)>,
    pub viewport: Option<[GLint; 4]>,
    pub scissor: Option<[GLint; 4]>,
    pub clear_color: [f32; 4],
    pub clear_depth: f32,
    pub pixel_store: BTreeMap<GLenum, GLint>,
    /// Color each framebuffer was last cleared to (0 is the default target)
    pub framebuffer_colors: BTreeMap<GLuint, [f32; 4]>,
    /// (program, location) -> value
    pub uniform_ints: BTreeMap<(GLuint, GLint), GLint>,
    pub uniform_matrices: BTreeMap<(GLuint, GLint), [f32; 16]>,

    pub draws: Vec<MockDraw>,
}

fn lowest_free<V>(names: &BTreeMap<GLuint, V>) -> GLuint {
    let mut name = 1;
    while names.contains_key(&name) {
        name += 1;
    }
    name
}

fn is_texture_target(cap: GLenum) -> bool {
    cap == GL_TEXTURE_2D || cap == GL_TEXTURE_RECTANGLE
}

/// Last whitespace-separated token of `attribute`/`uniform` declarations
fn declared_names(source: &str, qualifier: &str) -> Vec<String> {
    source
        .lines()
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.first() {
                Some(first) if *first == qualifier && tokens.len() >= 3 => {
                    tokens.last().map(|name| name.trim_end_matches(';').to_string())
                }
                _ => None,
            }
        })
        .collect()
}

impl MockGlState {
    fn log(&mut self, call: String) {
        if let Some(index) = self
            .pending_failures
            .iter()
            .position(|(name, _)| call.starts_with(name.as_str()) && call[name.len()..].starts_with('('))
        {
            let (_, code) = self.pending_failures.remove(index);
            self.errors.push(code);
        }
        self.calls.push(call);
    }

    fn error(&mut self, code: GLenum) {
        self.errors.push(code);
    }

    fn require_fixed_function(&mut self) -> bool {
        if !self.fixed_function {
            self.error(GL_INVALID_OPERATION);
        }
        self.fixed_function
    }

    fn cap_key(&self, cap: GLenum) -> (GLenum, u32) {
        if is_texture_target(cap) {
            (cap, self.active_unit)
        } else {
            (cap, 0)
        }
    }

    fn bound_texture(&self, target: GLenum) -> Option<GLuint> {
        self.bound_textures
            .get(&(self.active_unit, target))
            .copied()
            .filter(|name| *name != 0)
    }

    fn bound_buffer(&self, target: GLenum) -> GLuint {
        if target == GL_ELEMENT_ARRAY_BUFFER {
            self.bound_element_buffer
        } else {
            self.bound_array_buffer
        }
    }

    // ===== QUERIES FOR TESTS =====

    pub fn is_enabled(&self, cap: GLenum) -> bool {
        self.enabled.contains(&(cap, 0))
    }

    pub fn is_texture_enabled(&self, unit: u32, target: GLenum) -> bool {
        self.enabled.contains(&(target, unit))
    }

    pub fn tex_env_value(&self, unit: u32, pname: GLenum) -> Option<GLint> {
        self.tex_env.get(&(unit, pname)).copied()
    }

    pub fn texture_bound_to(&self, unit: u32, target: GLenum) -> Option<GLuint> {
        self.bound_textures.get(&(unit, target)).copied().filter(|name| *name != 0)
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| c.starts_with(name) && c[name.len()..].starts_with('('))
            .count()
    }

    pub fn has_call(&self, call: &str) -> bool {
        self.calls.iter().any(|c| c == call)
    }
}

/// Shared-state mock context
#[derive(Debug, Clone)]
pub struct MockGl {
    state: Arc<Mutex<MockGlState>>,
}

impl MockGl {
    /// Desktop compatibility context: framebuffers, VBOs, shaders, power-of-two
    /// textures only, 2048 max size
    pub fn desktop() -> Self {
        Self::with_capabilities(Capabilities {
            has_framebuffer_support: true,
            has_npt_support: false,
            has_texture_rectangle_support: false,
            has_vbo_support: true,
            has_shader_support: true,
            max_texture_width: 2048,
            max_texture_height: 2048,
        })
    }

    /// ES2 context: no fixed function, NPT textures, no unpack row length
    pub fn es2() -> Self {
        let gl = Self::with_capabilities(Capabilities {
            has_framebuffer_support: true,
            has_npt_support: true,
            has_texture_rectangle_support: false,
            has_vbo_support: true,
            has_shader_support: true,
            max_texture_width: 4096,
            max_texture_height: 4096,
        });
        {
            let mut state = gl.state();
            state.fixed_function = false;
            state.unpack_row_length = false;
        }
        gl
    }

    /// Desktop-style context with explicit capability flags
    pub fn with_capabilities(capabilities: Capabilities) -> Self {
        let state = MockGlState {
            capabilities,
            fixed_function: true,
            unpack_row_length: true,
            depth_mask: true,
            matrix_mode: GL_MODELVIEW,
            ..Default::default()
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Lock the simulated context for inspection
    pub fn state(&self) -> MutexGuard<'_, MockGlState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make the next call named `name` (e.g. `"glTexImage2D"`) raise `code`
    pub fn fail_call(&self, name: &str, code: GLenum) {
        self.state().pending_failures.push((name.to_string(), code));
    }

    /// Every compile fails while set
    pub fn set_compile_failures(&self, fail: bool) {
        self.state().compile_failures = fail;
    }

    /// Force `glCheckFramebufferStatus` to return `status` (`None` simulates)
    pub fn force_framebuffer_status(&self, status: Option<GLenum>) {
        self.state().forced_framebuffer_status = status;
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn count_calls(&self, name: &str) -> usize {
        self.state().count_calls(name)
    }

    pub fn has_call(&self, call: &str) -> bool {
        self.state().has_call(call)
    }
}

impl GlApi for MockGl {
    fn capabilities(&self) -> Capabilities {
        self.state().capabilities
    }

    fn supports_unpack_row_length(&self) -> bool {
        self.state().unpack_row_length
    }

    // ===== GENERAL STATE =====

    fn get_error(&mut self) -> GLenum {
        let mut s = self.state();
        if s.errors.is_empty() {
            GL_NO_ERROR
        } else {
            s.errors.remove(0)
        }
    }

    fn enable(&mut self, cap: GLenum) {
        let mut s = self.state();
        s.log(format!("glEnable({:#06x})", cap));
        if (cap == GL_ALPHA_TEST || is_texture_target(cap)) && !s.require_fixed_function() {
            return;
        }
        let key = s.cap_key(cap);
        s.enabled.insert(key);
    }

    fn disable(&mut self, cap: GLenum) {
        let mut s = self.state();
        s.log(format!("glDisable({:#06x})", cap));
        if (cap == GL_ALPHA_TEST || is_texture_target(cap)) && !s.require_fixed_function() {
            return;
        }
        let key = s.cap_key(cap);
        s.enabled.remove(&key);
    }

    fn get_integer(&mut self, pname: GLenum) -> GLint {
        let mut s = self.state();
        s.log(format!("glGetIntegerv({:#06x})", pname));
        match pname {
            GL_MAX_TEXTURE_SIZE => s.capabilities.max_texture_width as GLint,
            GL_MAX_RECTANGLE_TEXTURE_SIZE if s.capabilities.has_texture_rectangle_support => {
                s.capabilities.max_texture_width as GLint
            }
            _ => 0,
        }
    }

    fn pixel_store_i(&mut self, pname: GLenum, param: GLint) {
        let mut s = self.state();
        s.log(format!("glPixelStorei({:#06x}, {})", pname, param));
        if pname == GL_UNPACK_ROW_LENGTH && !s.unpack_row_length {
            s.error(GL_INVALID_ENUM);
            return;
        }
        s.pixel_store.insert(pname, param);
    }

    fn finish(&mut self) {
        self.state().log("glFinish()".to_string());
    }

    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        let mut s = self.state();
        s.log(format!("glViewport({}, {}, {}, {})", x, y, width, height));
        s.viewport = Some([x, y, width, height]);
    }

    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        let mut s = self.state();
        s.log(format!("glScissor({}, {}, {}, {})", x, y, width, height));
        if width < 0 || height < 0 {
            s.error(GL_INVALID_VALUE);
            return;
        }
        s.scissor = Some([x, y, width, height]);
    }

    fn depth_func(&mut self, func: GLenum) {
        let mut s = self.state();
        s.log(format!("glDepthFunc({:#06x})", func));
        s.depth_func = Some(func);
    }

    fn depth_mask(&mut self, flag: bool) {
        let mut s = self.state();
        s.log(format!("glDepthMask({})", flag));
        s.depth_mask = flag;
    }

    fn depth_range(&mut self, near: f32, far: f32) {
        let mut s = self.state();
        s.log(format!("glDepthRangef({}, {})", near, far));
        s.depth_range = Some((near, far));
    }

    fn blend_func(&mut self, src: GLenum, dst: GLenum) {
        let mut s = self.state();
        s.log(format!("glBlendFunc({:#06x}, {:#06x})", src, dst));
        s.blend_func = Some((src, dst, src, dst));
    }

    fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        let mut s = self.state();
        s.log(format!(
            "glBlendFuncSeparate({:#06x}, {:#06x}, {:#06x}, {:#06x})",
            src_rgb, dst_rgb, src_alpha, dst_alpha
        ));
        s.blend_func = Some((src_rgb, dst_rgb, src_alpha, dst_alpha));
    }

    fn blend_equation(&mut self, mode: GLenum) {
        let mut s = self.state();
        s.log(format!("glBlendEquation({:#06x})", mode));
        s.blend_equation = Some(mode);
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        let mut s = self.state();
        s.log(format!("glClearColor({}, {}, {}, {})", r, g, b, a));
        s.clear_color = [r, g, b, a];
    }

    fn clear_depth(&mut self, depth: f32) {
        let mut s = self.state();
        s.log(format!("glClearDepth({})", depth));
        s.clear_depth = depth;
    }

    fn clear(&mut self, mask: GLbitfield) {
        let mut s = self.state();
        s.log(format!("glClear({:#06x})", mask));
        if mask & GL_COLOR_BUFFER_BIT != 0 {
            let (target, color) = (s.bound_framebuffer, s.clear_color);
            s.framebuffer_colors.insert(target, color);
        }
    }

    // ===== TEXTURES =====

    fn gen_texture(&mut self) -> GLuint {
        let mut s = self.state();
        let name = lowest_free(&s.textures);
        s.log(format!("glGenTextures() -> {}", name));
        s.textures.insert(name, MockTexture::default());
        name
    }

    fn delete_texture(&mut self, texture: GLuint) {
        let mut s = self.state();
        s.log(format!("glDeleteTextures({})", texture));
        s.textures.remove(&texture);
        s.bound_textures.retain(|_, bound| *bound != texture);
    }

    fn active_texture(&mut self, unit: GLenum) {
        let mut s = self.state();
        s.log(format!("glActiveTexture({:#06x})", unit));
        s.active_unit = unit - GL_TEXTURE0;
    }

    fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        let mut s = self.state();
        s.log(format!("glBindTexture({:#06x}, {})", target, texture));
        if texture != 0 {
            match s.textures.get_mut(&texture) {
                Some(tex) if tex.target == 0 || tex.target == target => tex.target = target,
                _ => {
                    s.error(GL_INVALID_OPERATION);
                    return;
                }
            }
        }
        let unit = s.active_unit;
        s.bound_textures.insert((unit, target), texture);
    }

    fn tex_parameter_i(&mut self, target: GLenum, pname: GLenum, param: GLint) {
        let mut s = self.state();
        s.log(format!("glTexParameteri({:#06x}, {:#06x}, {:#06x})", target, pname, param));
        match s.bound_texture(target) {
            Some(name) => {
                if let Some(tex) = s.textures.get_mut(&name) {
                    tex.params.insert(pname, param);
                }
            }
            None => s.error(GL_INVALID_OPERATION),
        }
    }

    fn tex_image_2d(
        &mut self,
        target: GLenum,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    ) {
        let mut s = self.state();
        s.log(format!(
            "glTexImage2D({:#06x}, {:#06x}, {}, {}, {:#06x}, {:#06x})",
            target, internal_format, width, height, format, ty
        ));
        let max = s.capabilities.max_texture_width.max(s.capabilities.max_texture_height) as GLsizei;
        if width < 0 || height < 0 || width > max || height > max {
            s.error(GL_INVALID_VALUE);
            return;
        }
        let size = width as usize * height as usize * 4;
        if pixels.is_some_and(|p| p.len() < size) {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        let Some(name) = s.bound_texture(target) else {
            s.error(GL_INVALID_OPERATION);
            return;
        };
        if let Some(tex) = s.textures.get_mut(&name) {
            tex.width = width;
            tex.height = height;
            tex.pixels = match pixels {
                Some(p) => p[..size].to_vec(),
                None => vec![0; size],
            };
        }
    }

    fn tex_sub_image_2d(
        &mut self,
        target: GLenum,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: &[u8],
    ) {
        let mut s = self.state();
        s.log(format!(
            "glTexSubImage2D({:#06x}, {}, {}, {}, {}, {:#06x}, {:#06x})",
            target, x, y, width, height, format, ty
        ));
        let Some(name) = s.bound_texture(target) else {
            s.error(GL_INVALID_OPERATION);
            return;
        };
        let row_length = match s.pixel_store.get(&GL_UNPACK_ROW_LENGTH).copied().unwrap_or(0) {
            0 => width as usize,
            n => n as usize,
        };
        let Some(tex) = s.textures.get(&name) else {
            s.error(GL_INVALID_OPERATION);
            return;
        };
        if x < 0 || y < 0 || width < 0 || height < 0 || x + width > tex.width || y + height > tex.height {
            s.error(GL_INVALID_VALUE);
            return;
        }
        let (width, height) = (width as usize, height as usize);
        if height > 0 && pixels.len() < ((height - 1) * row_length + width) * 4 {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        let tex_width = tex.width as usize;
        let mut stored = tex.pixels.clone();
        for row in 0..height {
            for col in 0..width {
                let src = (row * row_length + col) * 4;
                let dst = ((y as usize + row) * tex_width + x as usize + col) * 4;
                let px = &pixels[src..src + 4];
                let rgba = if format == GL_BGRA { [px[2], px[1], px[0], px[3]] } else { [px[0], px[1], px[2], px[3]] };
                stored[dst..dst + 4].copy_from_slice(&rgba);
            }
        }
        if let Some(tex) = s.textures.get_mut(&name) {
            tex.pixels = stored;
        }
    }

    fn read_pixels(
        &mut self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: &mut [u8],
    ) {
        let mut s = self.state();
        s.log(format!(
            "glReadPixels({}, {}, {}, {}, {:#06x}, {:#06x})",
            x, y, width, height, format, ty
        ));
        let size = width.max(0) as usize * height.max(0) as usize * 4;
        if pixels.len() < size {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        let color = s.framebuffer_colors.get(&s.bound_framebuffer).copied().unwrap_or_default();
        let bytes = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        let px = if format == GL_BGRA { [bytes[2], bytes[1], bytes[0], bytes[3]] } else { bytes };
        for chunk in pixels[..size].chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    // ===== FIXED FUNCTION =====

    fn matrix_mode(&mut self, mode: GLenum) {
        let mut s = self.state();
        s.log(format!("glMatrixMode({:#06x})", mode));
        if s.require_fixed_function() {
            s.matrix_mode = mode;
        }
    }

    fn load_matrix(&mut self, matrix: &[f32; 16]) {
        let mut s = self.state();
        s.log("glLoadMatrixf(..)".to_string());
        if s.require_fixed_function() {
            let mode = s.matrix_mode;
            s.matrices.insert(mode, *matrix);
        }
    }

    fn alpha_func(&mut self, func: GLenum, reference: f32) {
        let mut s = self.state();
        s.log(format!("glAlphaFunc({:#06x}, {})", func, reference));
        if s.require_fixed_function() {
            s.alpha_func = Some((func, reference));
        }
    }

    fn tex_env_i(&mut self, target: GLenum, pname: GLenum, param: GLint) {
        let mut s = self.state();
        s.log(format!("glTexEnvi({:#06x}, {:#06x}, {:#06x})", target, pname, param));
        if s.require_fixed_function() {
            let unit = s.active_unit;
            s.tex_env.insert((unit, pname), param);
        }
    }

    fn enable_client_state(&mut self, array: GLenum) {
        let mut s = self.state();
        s.log(format!("glEnableClientState({:#06x})", array));
        if s.require_fixed_function() {
            let unit = if array == GL_TEXTURE_COORD_ARRAY { s.client_active_unit } else { 0 };
            s.client_arrays.insert((array, unit));
        }
    }

    fn disable_client_state(&mut self, array: GLenum) {
        let mut s = self.state();
        s.log(format!("glDisableClientState({:#06x})", array));
        if s.require_fixed_function() {
            let unit = if array == GL_TEXTURE_COORD_ARRAY { s.client_active_unit } else { 0 };
            s.client_arrays.remove(&(array, unit));
        }
    }

    fn client_active_texture(&mut self, unit: GLenum) {
        let mut s = self.state();
        s.log(format!("glClientActiveTexture({:#06x})", unit));
        if s.require_fixed_function() {
            s.client_active_unit = unit - GL_TEXTURE0;
        }
    }

    unsafe fn vertex_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>) {
        let mut s = self.state();
        s.log(format!("glVertexPointer({}, {:#06x}, {}, {})", size, ty, stride, describe_pointer(pointer)));
        s.require_fixed_function();
    }

    unsafe fn color_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>) {
        let mut s = self.state();
        s.log(format!("glColorPointer({}, {:#06x}, {}, {})", size, ty, stride, describe_pointer(pointer)));
        s.require_fixed_function();
    }

    unsafe fn tex_coord_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>) {
        let mut s = self.state();
        s.log(format!("glTexCoordPointer({}, {:#06x}, {}, {})", size, ty, stride, describe_pointer(pointer)));
        s.require_fixed_function();
    }

    // ===== BUFFERS =====

    fn gen_buffer(&mut self) -> GLuint {
        let mut s = self.state();
        let name = lowest_free(&s.buffers);
        s.log(format!("glGenBuffers() -> {}", name));
        s.buffers.insert(name, MockBuffer::default());
        name
    }

    fn delete_buffer(&mut self, buffer: GLuint) {
        let mut s = self.state();
        s.log(format!("glDeleteBuffers({})", buffer));
        s.buffers.remove(&buffer);
        if s.bound_array_buffer == buffer {
            s.bound_array_buffer = 0;
        }
        if s.bound_element_buffer == buffer {
            s.bound_element_buffer = 0;
        }
    }

    fn bind_buffer(&mut self, target: GLenum, buffer: GLuint) {
        let mut s = self.state();
        s.log(format!("glBindBuffer({:#06x}, {})", target, buffer));
        if buffer != 0 && !s.buffers.contains_key(&buffer) {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        if target == GL_ELEMENT_ARRAY_BUFFER {
            s.bound_element_buffer = buffer;
        } else {
            s.bound_array_buffer = buffer;
        }
    }

    fn buffer_data(&mut self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum) {
        let mut s = self.state();
        s.log(format!("glBufferData({:#06x}, {}, {:#06x})", target, size, usage));
        let bound = s.bound_buffer(target);
        if data.is_some_and(|d| d.len() < size) {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        match s.buffers.get_mut(&bound) {
            Some(buffer) => {
                buffer.data = match data {
                    Some(d) => d[..size].to_vec(),
                    None => vec![0; size],
                };
                buffer.usage = usage;
            }
            None => s.error(GL_INVALID_OPERATION),
        }
    }

    fn buffer_sub_data(&mut self, target: GLenum, offset: usize, data: &[u8]) {
        let mut s = self.state();
        s.log(format!("glBufferSubData({:#06x}, {}, {})", target, offset, data.len()));
        let bound = s.bound_buffer(target);
        match s.buffers.get_mut(&bound) {
            Some(buffer) if offset + data.len() <= buffer.data.len() => {
                buffer.data[offset..offset + data.len()].copy_from_slice(data);
            }
            Some(_) => s.error(GL_INVALID_VALUE),
            None => s.error(GL_INVALID_OPERATION),
        }
    }

    // ===== FRAMEBUFFERS =====

    fn gen_framebuffer(&mut self) -> GLuint {
        let mut s = self.state();
        let name = lowest_free(&s.framebuffers);
        s.log(format!("glGenFramebuffers() -> {}", name));
        s.framebuffers.insert(name, MockFramebuffer::default());
        name
    }

    fn delete_framebuffer(&mut self, framebuffer: GLuint) {
        let mut s = self.state();
        s.log(format!("glDeleteFramebuffers({})", framebuffer));
        s.framebuffers.remove(&framebuffer);
        s.framebuffer_colors.remove(&framebuffer);
        if s.bound_framebuffer == framebuffer {
            s.bound_framebuffer = 0;
        }
    }

    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
        let mut s = self.state();
        s.log(format!("glBindFramebuffer({:#06x}, {})", target, framebuffer));
        if framebuffer != 0 && !s.framebuffers.contains_key(&framebuffer) {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        s.bound_framebuffer = framebuffer;
    }

    fn framebuffer_texture_2d(&mut self, target: GLenum, attachment: GLenum, tex_target: GLenum, texture: GLuint) {
        let mut s = self.state();
        s.log(format!(
            "glFramebufferTexture2D({:#06x}, {:#06x}, {:#06x}, {})",
            target, attachment, tex_target, texture
        ));
        let bound = s.bound_framebuffer;
        match s.framebuffers.get_mut(&bound) {
            Some(fb) if attachment == GL_COLOR_ATTACHMENT0 => fb.color = Some(texture).filter(|t| *t != 0),
            _ => s.error(GL_INVALID_OPERATION),
        }
    }

    fn framebuffer_renderbuffer(&mut self, target: GLenum, attachment: GLenum, renderbuffer: GLuint) {
        let mut s = self.state();
        s.log(format!(
            "glFramebufferRenderbuffer({:#06x}, {:#06x}, {})",
            target, attachment, renderbuffer
        ));
        let bound = s.bound_framebuffer;
        let rb = Some(renderbuffer).filter(|r| *r != 0);
        match s.framebuffers.get_mut(&bound) {
            Some(fb) if attachment == GL_DEPTH_ATTACHMENT => fb.depth = rb,
            Some(fb) if attachment == GL_STENCIL_ATTACHMENT => fb.stencil = rb,
            _ => s.error(GL_INVALID_OPERATION),
        }
    }

    fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum {
        let mut s = self.state();
        s.log(format!("glCheckFramebufferStatus({:#06x})", target));
        if let Some(status) = s.forced_framebuffer_status {
            return status;
        }
        if s.bound_framebuffer == 0 {
            return GL_FRAMEBUFFER_COMPLETE;
        }
        let Some(fb) = s.framebuffers.get(&s.bound_framebuffer) else {
            return GL_FRAMEBUFFER_UNSUPPORTED;
        };
        let color_ok = fb
            .color
            .and_then(|t| s.textures.get(&t))
            .is_some_and(|t| t.width > 0 && t.height > 0);
        let depth_ok = fb.depth.map_or(true, |r| s.renderbuffers.contains_key(&r));
        let stencil_ok = fb.stencil.map_or(true, |r| s.renderbuffers.contains_key(&r));
        if color_ok && depth_ok && stencil_ok {
            GL_FRAMEBUFFER_COMPLETE
        } else {
            GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        }
    }

    fn gen_renderbuffer(&mut self) -> GLuint {
        let mut s = self.state();
        let name = lowest_free(&s.renderbuffers);
        s.log(format!("glGenRenderbuffers() -> {}", name));
        s.renderbuffers.insert(name, MockRenderbuffer::default());
        name
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GLuint) {
        let mut s = self.state();
        s.log(format!("glDeleteRenderbuffers({})", renderbuffer));
        s.renderbuffers.remove(&renderbuffer);
        if s.bound_renderbuffer == renderbuffer {
            s.bound_renderbuffer = 0;
        }
    }

    fn bind_renderbuffer(&mut self, renderbuffer: GLuint) {
        let mut s = self.state();
        s.log(format!("glBindRenderbuffer({})", renderbuffer));
        if renderbuffer != 0 && !s.renderbuffers.contains_key(&renderbuffer) {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        s.bound_renderbuffer = renderbuffer;
    }

    fn renderbuffer_storage(&mut self, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        let mut s = self.state();
        s.log(format!("glRenderbufferStorage({:#06x}, {}, {})", internal_format, width, height));
        let bound = s.bound_renderbuffer;
        match s.renderbuffers.get_mut(&bound) {
            Some(rb) => *rb = MockRenderbuffer { internal_format, width, height },
            None => s.error(GL_INVALID_OPERATION),
        }
    }

    // ===== SHADERS =====

    fn create_shader(&mut self, ty: GLenum) -> GLuint {
        let mut s = self.state();
        let name = lowest_free(&s.shaders);
        s.log(format!("glCreateShader({:#06x}) -> {}", ty, name));
        s.shaders.insert(name, MockShader { ty, ..Default::default() });
        name
    }

    fn delete_shader(&mut self, shader: GLuint) {
        let mut s = self.state();
        s.log(format!("glDeleteShader({})", shader));
        s.shaders.remove(&shader);
    }

    fn shader_source(&mut self, shader: GLuint, source: &str) {
        let mut s = self.state();
        s.log(format!("glShaderSource({})", shader));
        match s.shaders.get_mut(&shader) {
            Some(sh) => sh.source = source.to_string(),
            None => s.error(GL_INVALID_VALUE),
        }
    }

    fn compile_shader(&mut self, shader: GLuint) {
        let mut s = self.state();
        s.log(format!("glCompileShader({})", shader));
        let fail = s.compile_failures;
        match s.shaders.get_mut(&shader) {
            Some(sh) => sh.compiled = !fail && !sh.source.trim().is_empty(),
            None => s.error(GL_INVALID_VALUE),
        }
    }

    fn get_shader_i(&mut self, shader: GLuint, pname: GLenum) -> GLint {
        let mut s = self.state();
        s.log(format!("glGetShaderiv({}, {:#06x})", shader, pname));
        match s.shaders.get(&shader) {
            Some(sh) if pname == GL_COMPILE_STATUS => if sh.compiled { GL_TRUE } else { GL_FALSE },
            Some(_) => 0,
            None => {
                s.error(GL_INVALID_VALUE);
                0
            }
        }
    }

    fn create_program(&mut self) -> GLuint {
        let mut s = self.state();
        let name = lowest_free(&s.programs);
        s.log(format!("glCreateProgram() -> {}", name));
        s.programs.insert(name, MockProgram::default());
        name
    }

    fn delete_program(&mut self, program: GLuint) {
        let mut s = self.state();
        s.log(format!("glDeleteProgram({})", program));
        s.programs.remove(&program);
        if s.current_program == program {
            s.current_program = 0;
        }
    }

    fn attach_shader(&mut self, program: GLuint, shader: GLuint) {
        let mut s = self.state();
        s.log(format!("glAttachShader({}, {})", program, shader));
        if !s.shaders.contains_key(&shader) {
            s.error(GL_INVALID_VALUE);
            return;
        }
        match s.programs.get_mut(&program) {
            Some(p) => p.shaders.push(shader),
            None => s.error(GL_INVALID_VALUE),
        }
    }

    fn link_program(&mut self, program: GLuint) {
        let mut s = self.state();
        s.log(format!("glLinkProgram({})", program));
        let Some(attached) = s.programs.get(&program).map(|p| p.shaders.clone()) else {
            s.error(GL_INVALID_VALUE);
            return;
        };
        let sources: Vec<(bool, String)> = attached
            .iter()
            .filter_map(|sh| s.shaders.get(sh))
            .map(|sh| (sh.compiled, sh.source.clone()))
            .collect();
        let linked = !sources.is_empty() && sources.iter().all(|(compiled, _)| *compiled);
        let mut attributes = Vec::new();
        let mut uniforms: Vec<String> = Vec::new();
        for (_, source) in &sources {
            attributes.extend(declared_names(source, "attribute"));
            for name in declared_names(source, "uniform") {
                if !uniforms.contains(&name) {
                    uniforms.push(name);
                }
            }
        }
        if let Some(p) = s.programs.get_mut(&program) {
            p.linked = linked;
            p.attributes = attributes;
            p.uniforms = uniforms;
        }
    }

    fn use_program(&mut self, program: GLuint) {
        let mut s = self.state();
        s.log(format!("glUseProgram({})", program));
        if program != 0 && !s.programs.get(&program).is_some_and(|p| p.linked) {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        s.current_program = program;
    }

    fn get_uniform_location(&mut self, program: GLuint, name: &str) -> GLint {
        let mut s = self.state();
        s.log(format!("glGetUniformLocation({}, {})", program, name));
        s.programs
            .get(&program)
            .filter(|p| p.linked)
            .and_then(|p| p.uniforms.iter().position(|u| u == name))
            .map_or(-1, |i| i as GLint)
    }

    fn get_attrib_location(&mut self, program: GLuint, name: &str) -> GLint {
        let mut s = self.state();
        s.log(format!("glGetAttribLocation({}, {})", program, name));
        s.programs
            .get(&program)
            .filter(|p| p.linked)
            .and_then(|p| p.attributes.iter().position(|a| a == name))
            .map_or(-1, |i| i as GLint)
    }

    fn uniform_1i(&mut self, location: GLint, value: GLint) {
        let mut s = self.state();
        s.log(format!("glUniform1i({}, {})", location, value));
        let program = s.current_program;
        if program == 0 {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        s.uniform_ints.insert((program, location), value);
    }

    fn uniform_matrix_4fv(&mut self, location: GLint, matrix: &[f32; 16]) {
        let mut s = self.state();
        s.log(format!("glUniformMatrix4fv({})", location));
        let program = s.current_program;
        if program == 0 {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        s.uniform_matrices.insert((program, location), *matrix);
    }

    fn enable_vertex_attrib_array(&mut self, index: GLuint) {
        let mut s = self.state();
        s.log(format!("glEnableVertexAttribArray({})", index));
        s.attrib_arrays.insert(index);
    }

    fn disable_vertex_attrib_array(&mut self, index: GLuint) {
        let mut s = self.state();
        s.log(format!("glDisableVertexAttribArray({})", index));
        s.attrib_arrays.remove(&index);
    }

    unsafe fn vertex_attrib_pointer(
        &mut self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        pointer: AttribPointer<'_>,
    ) {
        self.state().log(format!(
            "glVertexAttribPointer({}, {}, {:#06x}, {}, {}, {})",
            index, size, ty, normalized, stride, describe_pointer(pointer)
        ));
    }

    // ===== DRAWING =====

    unsafe fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) {
        let mut s = self.state();
        s.log(format!("glDrawArrays({:#06x}, {}, {})", mode, first, count));
        let draw = MockDraw {
            mode,
            first,
            count,
            client_indices: None,
            index_offset: None,
            array_buffer: s.bound_array_buffer,
            element_buffer: s.bound_element_buffer,
            program: s.current_program,
            client_arrays: s.client_arrays.iter().copied().collect(),
            attrib_arrays: s.attrib_arrays.iter().copied().collect(),
        };
        s.draws.push(draw);
    }

    unsafe fn draw_elements(&mut self, mode: GLenum, count: GLsizei, indices: IndexSource<'_>) {
        let mut s = self.state();
        let (client_indices, index_offset) = match indices {
            IndexSource::Client(data) => (Some(data.to_vec()), None),
            IndexSource::Offset(offset) => (None, Some(offset)),
        };
        s.log(format!("glDrawElements({:#06x}, {}, {:#06x})", mode, count, GL_UNSIGNED_SHORT));
        if index_offset.is_some() && s.bound_element_buffer == 0 {
            s.error(GL_INVALID_OPERATION);
            return;
        }
        let draw = MockDraw {
            mode,
            first: 0,
            count,
            client_indices,
            index_offset,
            array_buffer: s.bound_array_buffer,
            element_buffer: s.bound_element_buffer,
            program: s.current_program,
            client_arrays: s.client_arrays.iter().copied().collect(),
            attrib_arrays: s.attrib_arrays.iter().copied().collect(),
        };
        s.draws.push(draw);
    }
}

fn describe_pointer(pointer: AttribPointer<'_>) -> String {
    match pointer {
        AttribPointer::Client(data) => format!("client[{}]", data.len()),
        AttribPointer::Offset(offset) => format!("offset {}", offset),
    }
}

#[cfg(test)]
#[path = "mock_gl_tests.rs"]
mod tests;
