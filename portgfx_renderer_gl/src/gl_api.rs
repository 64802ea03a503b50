/// GlApi - the native OpenGL call seam
///
/// Every GL entry point the backend issues goes through this trait. The
/// production implementation is `LoadedGl` (function pointers resolved through
/// the windowing layer's loader); `MockGl` implements it without a driver.
///
/// Methods that hand a raw pointer to the driver for later dereferencing
/// (client-side vertex arrays) are `unsafe`, as are the draw calls that read
/// through those pointers.

use portgfx::portgfx::graphics::Capabilities;

pub type GLenum = u32;
pub type GLuint = u32;
pub type GLint = i32;
pub type GLsizei = i32;
pub type GLfloat = f32;
pub type GLbitfield = u32;

// ===== ERRORS =====

pub const GL_NO_ERROR: GLenum = 0;
pub const GL_INVALID_ENUM: GLenum = 0x0500;
pub const GL_INVALID_VALUE: GLenum = 0x0501;
pub const GL_INVALID_OPERATION: GLenum = 0x0502;
pub const GL_STACK_OVERFLOW: GLenum = 0x0503;
pub const GL_STACK_UNDERFLOW: GLenum = 0x0504;
pub const GL_OUT_OF_MEMORY: GLenum = 0x0505;
pub const GL_INVALID_FRAMEBUFFER_OPERATION: GLenum = 0x0506;

pub const GL_FALSE: GLint = 0;
pub const GL_TRUE: GLint = 1;

// ===== CAPABILITIES (glEnable / glDisable) =====

pub const GL_BLEND: GLenum = 0x0BE2;
pub const GL_SCISSOR_TEST: GLenum = 0x0C11;
pub const GL_CULL_FACE: GLenum = 0x0B44;
pub const GL_DEPTH_TEST: GLenum = 0x0B71;
pub const GL_ALPHA_TEST: GLenum = 0x0BC0;
pub const GL_TEXTURE_2D: GLenum = 0x0DE1;
pub const GL_TEXTURE_RECTANGLE: GLenum = 0x84F5;

// ===== CLIENT ARRAYS =====

pub const GL_VERTEX_ARRAY: GLenum = 0x8074;
pub const GL_COLOR_ARRAY: GLenum = 0x8076;
pub const GL_TEXTURE_COORD_ARRAY: GLenum = 0x8078;

// ===== MATRICES =====

pub const GL_MODELVIEW: GLenum = 0x1700;
pub const GL_PROJECTION: GLenum = 0x1701;

// ===== TEXTURES =====

pub const GL_TEXTURE0: GLenum = 0x84C0;
pub const GL_TEXTURE_MAG_FILTER: GLenum = 0x2800;
pub const GL_TEXTURE_MIN_FILTER: GLenum = 0x2801;
pub const GL_TEXTURE_WRAP_S: GLenum = 0x2802;
pub const GL_TEXTURE_WRAP_T: GLenum = 0x2803;
pub const GL_NEAREST: GLint = 0x2600;
pub const GL_LINEAR: GLint = 0x2601;
pub const GL_REPEAT: GLint = 0x2901;
pub const GL_CLAMP_TO_EDGE: GLint = 0x812F;
pub const GL_MAX_TEXTURE_SIZE: GLenum = 0x0D33;
pub const GL_MAX_RECTANGLE_TEXTURE_SIZE: GLenum = 0x84F8;

// ===== PIXEL TRANSFER =====

pub const GL_RGBA: GLenum = 0x1908;
pub const GL_BGRA: GLenum = 0x80E1;
pub const GL_UNSIGNED_BYTE: GLenum = 0x1401;
pub const GL_UNSIGNED_SHORT: GLenum = 0x1403;
pub const GL_FLOAT: GLenum = 0x1406;
pub const GL_UNSIGNED_INT_8_8_8_8_REV: GLenum = 0x8367;
pub const GL_UNPACK_ROW_LENGTH: GLenum = 0x0CF2;
pub const GL_UNPACK_ALIGNMENT: GLenum = 0x0CF5;
pub const GL_PACK_ALIGNMENT: GLenum = 0x0D05;

// ===== TEXTURE ENVIRONMENT (combiners) =====

pub const GL_TEXTURE_ENV: GLenum = 0x2300;
pub const GL_TEXTURE_ENV_MODE: GLenum = 0x2200;
pub const GL_MODULATE: GLint = 0x2100;
pub const GL_REPLACE: GLint = 0x1E01;
pub const GL_BLEND_ENV: GLint = 0x0BE2;
pub const GL_COMBINE: GLint = 0x8570;
pub const GL_COMBINE_RGB: GLenum = 0x8571;
pub const GL_COMBINE_ALPHA: GLenum = 0x8572;
pub const GL_RGB_SCALE: GLenum = 0x8573;
pub const GL_SRC0_RGB: GLenum = 0x8580;
pub const GL_SRC1_RGB: GLenum = 0x8581;
pub const GL_SRC0_ALPHA: GLenum = 0x8588;
pub const GL_SRC1_ALPHA: GLenum = 0x8589;
pub const GL_OPERAND0_RGB: GLenum = 0x8590;
pub const GL_OPERAND1_RGB: GLenum = 0x8591;
pub const GL_OPERAND0_ALPHA: GLenum = 0x8598;
pub const GL_OPERAND1_ALPHA: GLenum = 0x8599;
pub const GL_PRIMARY_COLOR: GLint = 0x8577;
pub const GL_PREVIOUS: GLint = 0x8578;
pub const GL_TEXTURE: GLint = 0x1702;

// ===== BLENDING =====

pub const GL_ZERO: GLenum = 0;
pub const GL_ONE: GLenum = 1;
pub const GL_SRC_COLOR: GLenum = 0x0300;
pub const GL_ONE_MINUS_SRC_COLOR: GLenum = 0x0301;
pub const GL_SRC_ALPHA: GLenum = 0x0302;
pub const GL_ONE_MINUS_SRC_ALPHA: GLenum = 0x0303;
pub const GL_DST_ALPHA: GLenum = 0x0304;
pub const GL_ONE_MINUS_DST_ALPHA: GLenum = 0x0305;
pub const GL_DST_COLOR: GLenum = 0x0306;
pub const GL_ONE_MINUS_DST_COLOR: GLenum = 0x0307;
pub const GL_FUNC_ADD: GLenum = 0x8006;
pub const GL_FUNC_REVERSE_SUBTRACT: GLenum = 0x800B;

// ===== COMPARISON FUNCTIONS (depth / alpha test) =====

pub const GL_NEVER: GLenum = 0x0200;
pub const GL_LESS: GLenum = 0x0201;
pub const GL_EQUAL: GLenum = 0x0202;
pub const GL_LEQUAL: GLenum = 0x0203;
pub const GL_GREATER: GLenum = 0x0204;
pub const GL_NOTEQUAL: GLenum = 0x0205;
pub const GL_GEQUAL: GLenum = 0x0206;
pub const GL_ALWAYS: GLenum = 0x0207;

// ===== CLEAR =====

pub const GL_DEPTH_BUFFER_BIT: GLbitfield = 0x0000_0100;
pub const GL_COLOR_BUFFER_BIT: GLbitfield = 0x0000_4000;

// ===== PRIMITIVES =====

pub const GL_POINTS: GLenum = 0x0000;
pub const GL_LINES: GLenum = 0x0001;
pub const GL_TRIANGLES: GLenum = 0x0004;
pub const GL_TRIANGLE_STRIP: GLenum = 0x0005;
pub const GL_TRIANGLE_FAN: GLenum = 0x0006;

// ===== BUFFERS =====

pub const GL_ARRAY_BUFFER: GLenum = 0x8892;
pub const GL_ELEMENT_ARRAY_BUFFER: GLenum = 0x8893;
pub const GL_STREAM_DRAW: GLenum = 0x88E0;
pub const GL_STATIC_DRAW: GLenum = 0x88E4;
pub const GL_DYNAMIC_DRAW: GLenum = 0x88E8;

// ===== FRAMEBUFFERS =====

pub const GL_FRAMEBUFFER: GLenum = 0x8D40;
pub const GL_RENDERBUFFER: GLenum = 0x8D41;
pub const GL_COLOR_ATTACHMENT0: GLenum = 0x8CE0;
pub const GL_DEPTH_ATTACHMENT: GLenum = 0x8D00;
pub const GL_STENCIL_ATTACHMENT: GLenum = 0x8D20;
pub const GL_FRAMEBUFFER_COMPLETE: GLenum = 0x8CD5;
pub const GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT: GLenum = 0x8CD6;
pub const GL_FRAMEBUFFER_UNSUPPORTED: GLenum = 0x8CDD;
pub const GL_DEPTH24_STENCIL8: GLenum = 0x88F0;

// ===== SHADERS =====

pub const GL_FRAGMENT_SHADER: GLenum = 0x8B30;
pub const GL_VERTEX_SHADER: GLenum = 0x8B31;
pub const GL_COMPILE_STATUS: GLenum = 0x8B81;

/// Where a vertex attribute pointer reads from
///
/// `Client` points into caller memory that must stay alive (and unmoved) until
/// the draw call that consumes it has returned. `Offset` is a byte offset
/// into the buffer bound to `GL_ARRAY_BUFFER`.
#[derive(Debug, Clone, Copy)]
pub enum AttribPointer<'a> {
    Client(&'a [u8]),
    Offset(usize),
}

/// Where `glDrawElements` reads its 16-bit indices from
#[derive(Debug, Clone, Copy)]
pub enum IndexSource<'a> {
    Client(&'a [u16]),
    /// Byte offset into the buffer bound to `GL_ELEMENT_ARRAY_BUFFER`
    Offset(usize),
}

/// OpenGL (desktop compatibility profile or ES2) entry points used by the backend
///
/// Fixed-function entry points are no-ops on an ES2 context.
#[allow(clippy::too_many_arguments)]
pub trait GlApi: Send {
    /// Capability flags detected when the context was loaded
    fn capabilities(&self) -> Capabilities;

    /// Whether `GL_UNPACK_ROW_LENGTH` is honored (always on desktop,
    /// `GL_EXT_unpack_subimage` on ES2)
    fn supports_unpack_row_length(&self) -> bool;

    // ===== GENERAL STATE =====

    fn get_error(&mut self) -> GLenum;
    fn enable(&mut self, cap: GLenum);
    fn disable(&mut self, cap: GLenum);
    fn get_integer(&mut self, pname: GLenum) -> GLint;
    fn pixel_store_i(&mut self, pname: GLenum, param: GLint);
    fn finish(&mut self);

    fn viewport(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn scissor(&mut self, x: GLint, y: GLint, width: GLsizei, height: GLsizei);
    fn depth_func(&mut self, func: GLenum);
    fn depth_mask(&mut self, flag: bool);
    /// `glDepthRangef` when available, `glDepthRange` otherwise
    fn depth_range(&mut self, near: f32, far: f32);
    fn blend_func(&mut self, src: GLenum, dst: GLenum);
    fn blend_func_separate(&mut self, src_rgb: GLenum, dst_rgb: GLenum, src_alpha: GLenum, dst_alpha: GLenum);
    fn blend_equation(&mut self, mode: GLenum);
    fn clear_color(&mut self, r: f32, g: f32, b: f32, a: f32);
    fn clear_depth(&mut self, depth: f32);
    fn clear(&mut self, mask: GLbitfield);

    // ===== TEXTURES =====

    fn gen_texture(&mut self) -> GLuint;
    fn delete_texture(&mut self, texture: GLuint);
    fn active_texture(&mut self, unit: GLenum);
    fn bind_texture(&mut self, target: GLenum, texture: GLuint);
    fn tex_parameter_i(&mut self, target: GLenum, pname: GLenum, param: GLint);
    fn tex_image_2d(
        &mut self,
        target: GLenum,
        internal_format: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: Option<&[u8]>,
    );
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
    );
    fn read_pixels(
        &mut self,
        x: GLint,
        y: GLint,
        width: GLsizei,
        height: GLsizei,
        format: GLenum,
        ty: GLenum,
        pixels: &mut [u8],
    );

    // ===== FIXED FUNCTION =====

    fn matrix_mode(&mut self, mode: GLenum);
    fn load_matrix(&mut self, matrix: &[f32; 16]);
    fn alpha_func(&mut self, func: GLenum, reference: f32);
    fn tex_env_i(&mut self, target: GLenum, pname: GLenum, param: GLint);
    fn enable_client_state(&mut self, array: GLenum);
    fn disable_client_state(&mut self, array: GLenum);
    fn client_active_texture(&mut self, unit: GLenum);

    /// # Safety
    ///
    /// A `Client` pointer must stay valid until the next draw call returns.
    unsafe fn vertex_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>);

    /// # Safety
    ///
    /// See [`GlApi::vertex_pointer`].
    unsafe fn color_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>);

    /// # Safety
    ///
    /// See [`GlApi::vertex_pointer`].
    unsafe fn tex_coord_pointer(&mut self, size: GLint, ty: GLenum, stride: GLsizei, pointer: AttribPointer<'_>);

    // ===== BUFFERS =====

    fn gen_buffer(&mut self) -> GLuint;
    fn delete_buffer(&mut self, buffer: GLuint);
    fn bind_buffer(&mut self, target: GLenum, buffer: GLuint);
    /// Allocate `size` bytes, filled from `data` when given
    fn buffer_data(&mut self, target: GLenum, size: usize, data: Option<&[u8]>, usage: GLenum);
    fn buffer_sub_data(&mut self, target: GLenum, offset: usize, data: &[u8]);

    // ===== FRAMEBUFFERS =====

    fn gen_framebuffer(&mut self) -> GLuint;
    fn delete_framebuffer(&mut self, framebuffer: GLuint);
    fn bind_framebuffer(&mut self, target: GLenum, framebuffer: GLuint);
    fn framebuffer_texture_2d(&mut self, target: GLenum, attachment: GLenum, tex_target: GLenum, texture: GLuint);
    fn framebuffer_renderbuffer(&mut self, target: GLenum, attachment: GLenum, renderbuffer: GLuint);
    fn check_framebuffer_status(&mut self, target: GLenum) -> GLenum;
    fn gen_renderbuffer(&mut self) -> GLuint;
    fn delete_renderbuffer(&mut self, renderbuffer: GLuint);
    fn bind_renderbuffer(&mut self, renderbuffer: GLuint);
    fn renderbuffer_storage(&mut self, internal_format: GLenum, width: GLsizei, height: GLsizei);

    // ===== SHADERS =====

    fn create_shader(&mut self, ty: GLenum) -> GLuint;
    fn delete_shader(&mut self, shader: GLuint);
    fn shader_source(&mut self, shader: GLuint, source: &str);
    fn compile_shader(&mut self, shader: GLuint);
    fn get_shader_i(&mut self, shader: GLuint, pname: GLenum) -> GLint;
    fn create_program(&mut self) -> GLuint;
    fn delete_program(&mut self, program: GLuint);
    fn attach_shader(&mut self, program: GLuint, shader: GLuint);
    fn link_program(&mut self, program: GLuint);
    fn use_program(&mut self, program: GLuint);
    /// -1 when the program has no active uniform of that name
    fn get_uniform_location(&mut self, program: GLuint, name: &str) -> GLint;
    /// -1 when the program has no active attribute of that name
    fn get_attrib_location(&mut self, program: GLuint, name: &str) -> GLint;
    fn uniform_1i(&mut self, location: GLint, value: GLint);
    fn uniform_matrix_4fv(&mut self, location: GLint, matrix: &[f32; 16]);
    fn enable_vertex_attrib_array(&mut self, index: GLuint);
    fn disable_vertex_attrib_array(&mut self, index: GLuint);

    /// # Safety
    ///
    /// See [`GlApi::vertex_pointer`].
    unsafe fn vertex_attrib_pointer(
        &mut self,
        index: GLuint,
        size: GLint,
        ty: GLenum,
        normalized: bool,
        stride: GLsizei,
        pointer: AttribPointer<'_>,
    );

    // ===== DRAWING =====

    /// # Safety
    ///
    /// Every enabled client array must point at memory holding at least
    /// `first + count` vertices.
    unsafe fn draw_arrays(&mut self, mode: GLenum, first: GLint, count: GLsizei);

    /// # Safety
    ///
    /// As [`GlApi::draw_arrays`], for every index read from `indices`.
    unsafe fn draw_elements(&mut self, mode: GLenum, count: GLsizei, indices: IndexSource<'_>);
}

/// Human-readable name of a `glGetError` code
pub fn gl_error_name(code: GLenum) -> &'static str {
    match code {
        GL_NO_ERROR => "GL_NO_ERROR",
        GL_INVALID_ENUM => "GL_INVALID_ENUM",
        GL_INVALID_VALUE => "GL_INVALID_VALUE",
        GL_INVALID_OPERATION => "GL_INVALID_OPERATION",
        GL_STACK_OVERFLOW => "GL_STACK_OVERFLOW",
        GL_STACK_UNDERFLOW => "GL_STACK_UNDERFLOW",
        GL_OUT_OF_MEMORY => "GL_OUT_OF_MEMORY",
        GL_INVALID_FRAMEBUFFER_OPERATION => "GL_INVALID_FRAMEBUFFER_OPERATION",
        _ => "GL_UNKNOWN_ERROR",
    }
}
