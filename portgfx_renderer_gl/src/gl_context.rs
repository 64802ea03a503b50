/// LoadedGl - GlApi backed by driver function pointers
///
/// Entry points are resolved by name through a loader closure supplied by the
/// windowing layer (`SDL_GL_GetProcAddress`, glutin's `get_proc_address`,
/// ...). Optional entry points that resolve to null stay `None`; calling one of
/// them is a no-op and the matching capability flag is lowered.

use std::ffi::{c_char, c_void, CString};
use portgfx::portgfx::graphics::Capabilities;
use portgfx::portgfx::Result;
use portgfx::{engine_bail, engine_info};
use crate::gl_api::*;

type GLchar = c_char;

/// Which GL flavour the context speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GlProfile {
    /// Desktop compatibility profile (fixed function available)
    #[default]
    Desktop,
    /// OpenGL ES 2.0 (shaders only)
    Es2,
}

macro_rules! gl_functions {
    ($( $field:ident : fn($($arg:ty),*) $(-> $ret:ty)? = [$($name:literal),+]; )*) => {
        #[derive(Default)]
        struct GlFunctions {
            $( $field: Option<unsafe extern "system" fn($($arg),*) $(-> $ret)?>, )*
        }

        impl GlFunctions {
            /// Resolve every entry point, trying each alias in order
            fn load(loader: &mut dyn FnMut(&str) -> *const c_void) -> Self {
                Self {
                    $( $field: {
                        type Entry = unsafe extern "system" fn($($arg),*) $(-> $ret)?;
                        let mut found: Option<Entry> = None;
                        $(
                            if found.is_none() {
                                let ptr = loader($name);
                                if !ptr.is_null() {
                                    // SAFETY: the loader returns the driver's entry point
                                    // for this exact name and signature
                                    found = Some(unsafe {
                                        std::mem::transmute::<*const c_void, Entry>(ptr)
                                    });
                                }
                            }
                        )+
                        found
                    }, )*
                }
            }
        }
    };
}

gl_functions! {
    get_error: fn() -> GLenum = ["glGetError"];
    enable: fn(GLenum) = ["glEnable"];
    disable: fn(GLenum) = ["glDisable"];
    get_integerv: fn(GLenum, *mut GLint) = ["glGetIntegerv"];
    pixel_storei: fn(GLenum, GLint) = ["glPixelStorei"];
    finish: fn() = ["glFinish"];
    viewport: fn(GLint, GLint, GLsizei, GLsizei) = ["glViewport"];
    scissor: fn(GLint, GLint, GLsizei, GLsizei) = ["glScissor"];
    depth_func: fn(GLenum) = ["glDepthFunc"];
    depth_mask: fn(u8) = ["glDepthMask"];
    depth_rangef: fn(f32, f32) = ["glDepthRangef"];
    depth_range: fn(f64, f64) = ["glDepthRange"];
    blend_func: fn(GLenum, GLenum) = ["glBlendFunc"];
    blend_func_separate: fn(GLenum, GLenum, GLenum, GLenum) = ["glBlendFuncSeparate", "glBlendFuncSeparateEXT"];
    blend_equation: fn(GLenum) = ["glBlendEquation", "glBlendEquationEXT"];
    clear_color: fn(f32, f32, f32, f32) = ["glClearColor"];
    clear_depthf: fn(f32) = ["glClearDepthf"];
    clear_depth: fn(f64) = ["glClearDepth"];
    clear: fn(GLbitfield) = ["glClear"];

    gen_textures: fn(GLsizei, *mut GLuint) = ["glGenTextures"];
    delete_textures: fn(GLsizei, *const GLuint) = ["glDeleteTextures"];
    active_texture: fn(GLenum) = ["glActiveTexture", "glActiveTextureARB"];
    bind_texture: fn(GLenum, GLuint) = ["glBindTexture"];
    tex_parameteri: fn(GLenum, GLenum, GLint) = ["glTexParameteri"];
    tex_image_2d: fn(GLenum, GLint, GLint, GLsizei, GLsizei, GLint, GLenum, GLenum, *const c_void) = ["glTexImage2D"];
    tex_sub_image_2d: fn(GLenum, GLint, GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *const c_void) = ["glTexSubImage2D"];
    read_pixels: fn(GLint, GLint, GLsizei, GLsizei, GLenum, GLenum, *mut c_void) = ["glReadPixels"];

    matrix_mode: fn(GLenum) = ["glMatrixMode"];
    load_matrixf: fn(*const f32) = ["glLoadMatrixf"];
    alpha_func: fn(GLenum, f32) = ["glAlphaFunc"];
    tex_envi: fn(GLenum, GLenum, GLint) = ["glTexEnvi"];
    enable_client_state: fn(GLenum) = ["glEnableClientState"];
    disable_client_state: fn(GLenum) = ["glDisableClientState"];
    client_active_texture: fn(GLenum) = ["glClientActiveTexture", "glClientActiveTextureARB"];
    vertex_pointer: fn(GLint, GLenum, GLsizei, *const c_void) = ["glVertexPointer"];
    color_pointer: fn(GLint, GLenum, GLsizei, *const c_void) = ["glColorPointer"];
    tex_coord_pointer: fn(GLint, GLenum, GLsizei, *const c_void) = ["glTexCoordPointer"];

    gen_buffers: fn(GLsizei, *mut GLuint) = ["glGenBuffers", "glGenBuffersARB"];
    delete_buffers: fn(GLsizei, *const GLuint) = ["glDeleteBuffers", "glDeleteBuffersARB"];
    bind_buffer: fn(GLenum, GLuint) = ["glBindBuffer", "glBindBufferARB"];
    buffer_data: fn(GLenum, isize, *const c_void, GLenum) = ["glBufferData", "glBufferDataARB"];
    buffer_sub_data: fn(GLenum, isize, isize, *const c_void) = ["glBufferSubData", "glBufferSubDataARB"];

    gen_framebuffers: fn(GLsizei, *mut GLuint) = ["glGenFramebuffers", "glGenFramebuffersEXT"];
    delete_framebuffers: fn(GLsizei, *const GLuint) = ["glDeleteFramebuffers", "glDeleteFramebuffersEXT"];
    bind_framebuffer: fn(GLenum, GLuint) = ["glBindFramebuffer", "glBindFramebufferEXT"];
    framebuffer_texture_2d: fn(GLenum, GLenum, GLenum, GLuint, GLint) = ["glFramebufferTexture2D", "glFramebufferTexture2DEXT"];
    framebuffer_renderbuffer: fn(GLenum, GLenum, GLenum, GLuint) = ["glFramebufferRenderbuffer", "glFramebufferRenderbufferEXT"];
    check_framebuffer_status: fn(GLenum) -> GLenum = ["glCheckFramebufferStatus", "glCheckFramebufferStatusEXT"];
    gen_renderbuffers: fn(GLsizei, *mut GLuint) = ["glGenRenderbuffers", "glGenRenderbuffersEXT"];
    delete_renderbuffers: fn(GLsizei, *const GLuint) = ["glDeleteRenderbuffers", "glDeleteRenderbuffersEXT"];
    bind_renderbuffer: fn(GLenum, GLuint) = ["glBindRenderbuffer", "glBindRenderbufferEXT"];
    renderbuffer_storage: fn(GLenum, GLenum, GLsizei, GLsizei) = ["glRenderbufferStorage", "glRenderbufferStorageEXT"];

    create_shader: fn(GLenum) -> GLuint = ["glCreateShader"];
    delete_shader: fn(GLuint) = ["glDeleteShader"];
    shader_source: fn(GLuint, GLsizei, *const *const GLchar, *const GLint) = ["glShaderSource"];
    compile_shader: fn(GLuint) = ["glCompileShader"];
    get_shaderiv: fn(GLuint, GLenum, *mut GLint) = ["glGetShaderiv"];
    create_program: fn() -> GLuint = ["glCreateProgram"];
    delete_program: fn(GLuint) = ["glDeleteProgram"];
    attach_shader: fn(GLuint, GLuint) = ["glAttachShader"];
    link_program: fn(GLuint) = ["glLinkProgram"];
    use_program: fn(GLuint) = ["glUseProgram"];
    get_uniform_location: fn(GLuint, *const GLchar) -> GLint = ["glGetUniformLocation"];
    get_attrib_location: fn(GLuint, *const GLchar) -> GLint = ["glGetAttribLocation"];
    uniform1i: fn(GLint, GLint) = ["glUniform1i"];
    uniform_matrix4fv: fn(GLint, GLsizei, u8, *const f32) = ["glUniformMatrix4fv"];
    enable_vertex_attrib_array: fn(GLuint) = ["glEnableVertexAttribArray"];
    disable_vertex_attrib_array: fn(GLuint) = ["glDisableVertexAttribArray"];
    vertex_attrib_pointer: fn(GLuint, GLint, GLenum, u8, GLsizei, *const c_void) = ["glVertexAttribPointer"];

    draw_arrays: fn(GLenum, GLint, GLsizei) = ["glDrawArrays"];
    draw_elements: fn(GLenum, GLsizei, GLenum, *const c_void) = ["glDrawElements"];
}

/// Call a resolved entry point; `None` when it was not found at load time
macro_rules! gl_call {
    ($self:ident . $field:ident ( $($arg:expr),* )) => {
        match $self.fns.$field {
            // SAFETY: resolved by the loader with this signature; the context is
            // current on the calling thread
            Some(f) => Some(unsafe { f($($arg),*) }),
            None => None,
        }
    };
}

impl GlFunctions {
    fn has_vbo(&self) -> bool {
        self.gen_buffers.is_some()
            && self.delete_buffers.is_some()
            && self.bind_buffer.is_some()
            && self.buffer_data.is_some()
            && self.buffer_sub_data.is_some()
    }

    fn has_framebuffers(&self) -> bool {
        self.gen_framebuffers.is_some()
            && self.delete_framebuffers.is_some()
            && self.bind_framebuffer.is_some()
            && self.framebuffer_texture_2d.is_some()
            && self.framebuffer_renderbuffer.is_some()
            && self.check_framebuffer_status.is_some()
            && self.gen_renderbuffers.is_some()
            && self.delete_renderbuffers.is_some()
            && self.bind_renderbuffer.is_some()
            && self.renderbuffer_storage.is_some()
    }

    fn has_shaders(&self) -> bool {
        self.create_shader.is_some()
            && self.delete_shader.is_some()
            && self.shader_source.is_some()
            && self.compile_shader.is_some()
            && self.get_shaderiv.is_some()
            && self.create_program.is_some()
            && self.delete_program.is_some()
            && self.attach_shader.is_some()
            && self.link_program.is_some()
            && self.use_program.is_some()
            && self.get_uniform_location.is_some()
            && self.get_attrib_location.is_some()
            && self.uniform1i.is_some()
            && self.uniform_matrix4fv.is_some()
            && self.enable_vertex_attrib_array.is_some()
            && self.disable_vertex_attrib_array.is_some()
            && self.vertex_attrib_pointer.is_some()
    }

    /// Names of required entry points that failed to resolve
    fn missing_core(&self) -> Vec<&'static str> {
        [
            ("glGetError", self.get_error.is_some()),
            ("glEnable", self.enable.is_some()),
            ("glDisable", self.disable.is_some()),
            ("glGetIntegerv", self.get_integerv.is_some()),
            ("glViewport", self.viewport.is_some()),
            ("glClear", self.clear.is_some()),
            ("glGenTextures", self.gen_textures.is_some()),
            ("glDeleteTextures", self.delete_textures.is_some()),
            ("glActiveTexture", self.active_texture.is_some()),
            ("glBindTexture", self.bind_texture.is_some()),
            ("glTexParameteri", self.tex_parameteri.is_some()),
            ("glTexImage2D", self.tex_image_2d.is_some()),
            ("glTexSubImage2D", self.tex_sub_image_2d.is_some()),
            ("glDrawArrays", self.draw_arrays.is_some()),
            ("glDrawElements", self.draw_elements.is_some()),
        ]
        .into_iter()
        .filter(|(_, found)| !found)
        .map(|(name, _)| name)
        .collect()
    }

    /// ES2 contexts never expose the fixed-function entry points, even when a
    /// permissive loader resolves the names
    fn strip_fixed_function(&mut self) {
        self.matrix_mode = None;
        self.load_matrixf = None;
        self.alpha_func = None;
        self.tex_envi = None;
        self.enable_client_state = None;
        self.disable_client_state = None;
        self.client_active_texture = None;
        self.vertex_pointer = None;
        self.color_pointer = None;
        self.tex_coord_pointer = None;
    }
}

/// Function-pointer table of a live GL context
pub struct LoadedGl {
    fns: GlFunctions,
    profile: GlProfile,
    capabilities: Capabilities,
    unpack_row_length: bool,
}

impl LoadedGl {
    /// Resolve entry points and detect capabilities
    ///
    /// # Arguments
    ///
    /// * `profile` - flavour of the current context
    /// * `loader` - returns the address of a GL entry point, or null
    /// * `has_extension` - whether the context advertises an extension
    ///
    /// # Errors
    ///
    /// `InitializationFailed` when a required entry point is missing.
    pub fn load(
        profile: GlProfile,
        mut loader: impl FnMut(&str) -> *const c_void,
        has_extension: impl Fn(&str) -> bool,
    ) -> Result<Self> {
        let mut fns = GlFunctions::load(&mut loader);
        if profile == GlProfile::Es2 {
            fns.strip_fixed_function();
        }

        let missing = fns.missing_core();
        if !missing.is_empty() {
            engine_bail!(
                "portgfx::gl::Context",
                InitializationFailed => "missing GL entry points: {}",
                missing.join(", ")
            );
        }

        let mut gl = Self {
            fns,
            profile,
            capabilities: Capabilities::default(),
            unpack_row_length: profile == GlProfile::Desktop,
        };
        gl.capabilities = gl.detect_capabilities(&has_extension);
        if profile == GlProfile::Es2 {
            gl.unpack_row_length = has_extension("GL_EXT_unpack_subimage");
        }

        engine_info!(
            "portgfx::gl::Context",
            "GL loaded ({:?}): fbo={} vbo={} shaders={} npt={} rect={} max={}x{}",
            profile,
            gl.capabilities.has_framebuffer_support,
            gl.capabilities.has_vbo_support,
            gl.capabilities.has_shader_support,
            gl.capabilities.has_npt_support,
            gl.capabilities.has_texture_rectangle_support,
            gl.capabilities.max_texture_width,
            gl.capabilities.max_texture_height
        );
        Ok(gl)
    }

    pub fn profile(&self) -> GlProfile {
        self.profile
    }

    fn detect_capabilities(&mut self, has_extension: &dyn Fn(&str) -> bool) -> Capabilities {
        let mut caps = Capabilities {
            has_vbo_support: self.fns.has_vbo(),
            has_shader_support: self.fns.has_shaders(),
            ..Default::default()
        };

        let mut max_size;
        match self.profile {
            GlProfile::Desktop => {
                caps.has_framebuffer_support = self.fns.has_framebuffers()
                    && (has_extension("GL_ARB_framebuffer_object")
                        || has_extension("GL_EXT_framebuffer_object"));
                caps.has_npt_support = has_extension("GL_ARB_texture_non_power_of_two");
                if has_extension("GL_ARB_texture_rectangle") || has_extension("GL_EXT_texture_rectangle") {
                    caps.has_texture_rectangle_support = true;
                    max_size = self.get_integer(GL_MAX_RECTANGLE_TEXTURE_SIZE);
                } else {
                    max_size = self.get_integer(GL_MAX_TEXTURE_SIZE);
                }
            }
            GlProfile::Es2 => {
                caps.has_framebuffer_support = self.fns.has_framebuffers();
                caps.has_npt_support = true;
                max_size = self.get_integer(GL_MAX_TEXTURE_SIZE);
            }
        }
        if max_size <= 0 {
            max_size = 64;
        }
        caps.max_texture_width = max_size as u32;
        caps.max_texture_height = max_size as u32;
        caps
    }
}

fn pointer_of(pointer: AttribPointer<'_>) -> *const c_void {
    match pointer {
        AttribPointer::Client(data) => data.as_ptr() as *const c_void,
        AttribPointer::Offset(offset) => offset as *const c_void,
    }
}

impl GlApi for LoadedGl {
    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn supports_unpack_row_length(&self) -> bool {
        self.unpack_row_length
    }

    // ===== GENERAL STATE =====

    fn get_error(&mut self) -> GLenum {
        gl_call!(self.get_error()).unwrap_or(GL_NO_ERROR)
    }

    fn enable(&mut self, cap: GLenum) {
        gl_call!(self.enable(cap));
    }

    fn disable(&mut self, cap: GLenum) {
        gl_call!(self.disable(cap));
    }

    fn get_integer(&mut self, pname: GLenum) -> GLint {
        let mut value: GLint = 0;
        gl_call!(self.get_integerv(pname, &mut value));
        value
    }

    fn pixel_store_i(&mut self, pname: GLenum, param: GLint) {
        gl_call!(self.pixel_storei(pname, param));
    }

    fn finish(&mut self) {
        gl_call!(self.finish());
    }

    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        gl_call!(self.viewport(x, y, width, height));
    }

    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei) {
        gl_call!(self.scissor(x, y, width, height));
    }

    fn depth_func(&mut self, func: GLenum) {
        gl_call!(self.depth_func(func));
    }

    fn depth_mask(&mut self, flag: bool) {
        gl_call!(self.depth_mask(flag as u8));
    }

    fn depth_range(&mut self, near: f32, far: f32) {
        if gl_call!(self.depth_rangef(near, far)).is_none() {
            gl_call!(self.depth_range(near as f64, far as f64));
        }
    }

    fn blend_func(&mut self, src: GLenum, dst: GLenum) {
        gl_call!(self.blend_func(src, dst));
    }

    fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum) {
        if gl_call!(self.blend_func_separate(src_rgb, dst_rgb, src_alpha, dst_alpha)).is_none() {
            gl_call!(self.blend_func(src_rgb, dst_rgb));
        }
    }

    fn blend_equation(&mut self, mode: GLenum) {
        gl_call!(self.blend_equation(mode));
    }

    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        gl_call!(self.clear_color(r, g, b, a));
    }

    fn clear_depth(&mut self, depth: f32) {
        if gl_call!(self.clear_depthf(depth)).is_none() {
            gl_call!(self.clear_depth(depth as f64));
        }
    }

    fn clear(&mut self, mask: GLbitfield) {
        gl_call!(self.clear(mask));
    }

    // ===== TEXTURES =====

    fn gen_texture(&mut self) -> GLuint {
        let mut name: GLuint = 0;
        gl_call!(self.gen_textures(1, &mut name));
        name
    }

    fn delete_texture(&mut self, texture: GLuint) {
        gl_call!(self.delete_textures(1, &texture));
    }

    fn active_texture(&mut self, unit: GLenum) {
        gl_call!(self.active_texture(unit));
    }

    fn bind_texture(&mut self, target: GLenum, texture: GLuint) {
        gl_call!(self.bind_texture(target, texture));
    }

    fn tex_parameter_i(&mut self, target: GLenum, pname: GLenum, param: GLint) {
        gl_call!(self.tex_parameteri(target, pname, param));
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
        let data = pixels.map_or(std::ptr::null(), |p| p.as_ptr() as *const c_void);
        gl_call!(self.tex_image_2d(target, 0, internal_format, width, height, 0, format, ty, data));
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
        let data = pixels.as_ptr() as *const c_void;
        gl_call!(self.tex_sub_image_2d(target, 0, x, y, width, height, format, ty, data));
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
        let needed = width.max(0) as usize * height.max(0) as usize * 4;
        if pixels.len() < needed {
            return;
        }
        let data = pixels.as_mut_ptr() as *mut c_void;
        gl_call!(self.read_pixels(x, y, width, height, format, ty, data));
    }

    // ===== FIXED FUNCTION =====

    fn matrix_mode(&mut self, mode: GLenum) {
        gl_call!(self.matrix_mode(mode));
    }

    fn load_matrix(&mut self, matrix: &[f32; 16]) {
        gl_call!(self.load_matrixf(matrix.as_ptr()));
    }

    fn alpha_func(&mut self, func: GLenum, reference: f32) {
        gl_call!(self.alpha_func(func, reference));
    }

    fn tex_env_i(&mut self, target: GLenum, pname: GLenum, param: GLint) {
        gl_call!(self.tex_envi(target, pname, param));
    }

    fn enable_client_state(&mut self, array: GLenum) {
        gl_call!(self.enable_client_state(array));
    }

    fn disable_client_state(&mut self, array: GLenum) {
        gl_call!(self.disable_client_state(array));
    }

    fn client_active_texture(&mut self, unit: GLenum) {
        gl_call!(self.client_active_texture(unit));
    }

    unsafe fn vertex_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>) {
        gl_call!(self.vertex_pointer(size, ty, stride, pointer_of(pointer)));
    }

    unsafe fn color_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>) {
        gl_call!(self.color_pointer(size, ty, stride, pointer_of(pointer)));
    }

    unsafe fn tex_coord_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>) {
        gl_call!(self.tex_coord_pointer(size, ty, stride, pointer_of(pointer)));
    }

    // ===== BUFFERS =====

    fn gen_buffer(&mut self) -> GLuint {
        let mut name: GLuint = 0;
        gl_call!(self.gen_buffers(1, &mut name));
        name
    }

    fn delete_buffer(&mut self, buffer: GLuint) {
        gl_call!(self.delete_buffers(1, &buffer));
    }

    fn bind_buffer(&mut self, target: GLenum, buffer: GLuint) {
        gl_call!(self.bind_buffer(target, buffer));
    }

    fn buffer_data(&mut self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum) {
        let data = match data {
            Some(d) if d.len() >= size => d.as_ptr() as *const c_void,
            Some(_) => return,
            None => std::ptr::null(),
        };
        gl_call!(self.buffer_data(target, size as isize, data, usage));
    }

    fn buffer_sub_data(&mut self, target: GLenum, offset: usize, data: &[u8]) {
        let ptr = data.as_ptr() as *const c_void;
        gl_call!(self.buffer_sub_data(target, offset as isize, data.len() as isize, ptr));
    }

    // ===== FRAMEBUFFERS =====

    fn gen_framebuffer(&mut self) -> GLuint {
        let mut name: GLuint = 0;
        gl_call!(self.gen_framebuffers(1, &mut name));
        name
    }

    fn delete_framebuffer(&mut self, framebuffer: GLuint) {
        gl_call!(self.delete_framebuffers(1, &framebuffer));
    }

    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint) {
        gl_call!(self.bind_framebuffer(target, framebuffer));
    }

    fn framebuffer_texture_2d(&mut self, target: GLenum, attachment: GLenum, tex_target: GLenum, texture: GLuint) {
        gl_call!(self.framebuffer_texture_2d(target, attachment, tex_target, texture, 0));
    }

    fn framebuffer_renderbuffer(&mut self, target: GLenum, attachment: GLenum, renderbuffer: GLuint) {
        gl_call!(self.framebuffer_renderbuffer(target, attachment, GL_RENDERBUFFER, renderbuffer));
    }

    fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum {
        gl_call!(self.check_framebuffer_status(target)).unwrap_or(GL_FRAMEBUFFER_UNSUPPORTED)
    }

    fn gen_renderbuffer(&mut self) -> GLuint {
        let mut name: GLuint = 0;
        gl_call!(self.gen_renderbuffers(1, &mut name));
        name
    }

    fn delete_renderbuffer(&mut self, renderbuffer: GLuint) {
        gl_call!(self.delete_renderbuffers(1, &renderbuffer));
    }

    fn bind_renderbuffer(&mut self, renderbuffer: GLuint) {
        gl_call!(self.bind_renderbuffer(GL_RENDERBUFFER, renderbuffer));
    }

    fn renderbuffer_storage(&mut self, internal_format: GLenum, width: GLsizei, height: GLsizei) {
        gl_call!(self.renderbuffer_storage(GL_RENDERBUFFER, internal_format, width, height));
    }

    // ===== SHADERS =====

    fn create_shader(&mut self, ty: GLenum) -> GLuint {
        gl_call!(self.create_shader(ty)).unwrap_or(0)
    }

    fn delete_shader(&mut self, shader: GLuint) {
        gl_call!(self.delete_shader(shader));
    }

    fn shader_source(&mut self, shader: GLuint, source: &str) {
        let ptr = source.as_ptr() as *const GLchar;
        let len = source.len() as GLint;
        gl_call!(self.shader_source(shader, 1, &ptr, &len));
    }

    fn compile_shader(&mut self, shader: GLuint) {
        gl_call!(self.compile_shader(shader));
    }

    fn get_shader_i(&mut self, shader: GLuint, pname: GLenum) -> GLint {
        let mut value: GLint = 0;
        gl_call!(self.get_shaderiv(shader, pname, &mut value));
        value
    }

    fn create_program(&mut self) -> GLuint {
        gl_call!(self.create_program()).unwrap_or(0)
    }

    fn delete_program(&mut self, program: GLuint) {
        gl_call!(self.delete_program(program));
    }

    fn attach_shader(&mut self, program: GLuint, shader: GLuint) {
        gl_call!(self.attach_shader(program, shader));
    }

    fn link_program(&mut self, program: GLuint) {
        gl_call!(self.link_program(program));
    }

    fn use_program(&mut self, program: GLuint) {
        gl_call!(self.use_program(program));
    }

    fn get_uniform_location(&mut self, program: GLuint, name: &str) -> GLint {
        let Ok(name) = CString::new(name) else {
            return -1;
        };
        gl_call!(self.get_uniform_location(program, name.as_ptr())).unwrap_or(-1)
    }

    fn get_attrib_location(&mut self, program: GLuint, name: &str) -> GLint {
        let Ok(name) = CString::new(name) else {
            return -1;
        };
        gl_call!(self.get_attrib_location(program, name.as_ptr())).unwrap_or(-1)
    }

    fn uniform_1i(&mut self, location: GLint, value: GLint) {
        gl_call!(self.uniform1i(location, value));
    }

    fn uniform_matrix_4fv(&mut self, location: GLint, matrix: &[f32; 16]) {
        gl_call!(self.uniform_matrix4fv(location, 1, 0, matrix.as_ptr()));
    }

    fn enable_vertex_attrib_array(&mut self, index: GLuint) {
        gl_call!(self.enable_vertex_attrib_array(index));
    }

    fn disable_vertex_attrib_array(&mut self, index: GLuint) {
        gl_call!(self.disable_vertex_attrib_array(index));
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
        gl_call!(self.vertex_attrib_pointer(index, size, ty, normalized as u8, stride, pointer_of(pointer)));
    }

    // ===== DRAWING =====

    unsafe fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei) {
        gl_call!(self.draw_arrays(mode, first, count));
    }

    unsafe fn draw_elements(&mut self, mode: GLenum, count: GLsizei, indices: IndexSource<'_>) {
        let ptr = match indices {
            IndexSource::Client(data) => data.as_ptr() as *const c_void,
            IndexSource::Offset(offset) => offset as *const c_void,
        };
        gl_call!(self.draw_elements(mode, count, GL_UNSIGNED_SHORT, ptr));
    }
}

#[cfg(test)]
#[path = "gl_context_tests.rs"]
mod tests;
