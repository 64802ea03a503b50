//! Unit tests for the simulated GL context

use crate::gl_api::*;
use crate::mock_gl::MockGl;

#[test]
fn test_names_reuse_lowest_free() {
    let mut gl = MockGl::desktop();
    let a = gl.gen_texture();
    let b = gl.gen_texture();
    let c = gl.gen_texture();
    assert_eq!((a, b, c), (1, 2, 3));

    gl.delete_texture(b);
    assert_eq!(gl.gen_texture(), 2);
    assert_eq!(gl.gen_texture(), 4);
}

#[test]
fn test_tex_env_is_per_unit() {
    let mut gl = MockGl::desktop();
    gl.active_texture(GL_TEXTURE0);
    gl.tex_env_i(GL_TEXTURE_ENV, GL_TEXTURE_ENV_MODE, GL_COMBINE);
    gl.active_texture(GL_TEXTURE0 + 1);
    gl.tex_env_i(GL_TEXTURE_ENV, GL_TEXTURE_ENV_MODE, GL_MODULATE);

    let state = gl.state();
    assert_eq!(state.tex_env_value(0, GL_TEXTURE_ENV_MODE), Some(GL_COMBINE));
    assert_eq!(state.tex_env_value(1, GL_TEXTURE_ENV_MODE), Some(GL_MODULATE));
}

#[test]
fn test_fail_call_injects_error_once() {
    let mut gl = MockGl::desktop();
    gl.fail_call("glTexImage2D", GL_OUT_OF_MEMORY);

    let tex = gl.gen_texture();
    gl.bind_texture(GL_TEXTURE_2D, tex);
    assert_eq!(gl.get_error(), GL_NO_ERROR);

    gl.tex_image_2d(GL_TEXTURE_2D, GL_RGBA as GLint, 4, 4, GL_RGBA, GL_UNSIGNED_BYTE, None);
    assert_eq!(gl.get_error(), GL_OUT_OF_MEMORY);
    assert_eq!(gl.get_error(), GL_NO_ERROR);

    gl.tex_image_2d(GL_TEXTURE_2D, GL_RGBA as GLint, 4, 4, GL_RGBA, GL_UNSIGNED_BYTE, None);
    assert_eq!(gl.get_error(), GL_NO_ERROR);
}

#[test]
fn test_framebuffer_needs_sized_color_attachment() {
    let mut gl = MockGl::desktop();
    let fb = gl.gen_framebuffer();
    gl.bind_framebuffer(GL_FRAMEBUFFER, fb);
    assert_eq!(gl.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_INCOMPLETE_ATTACHMENT);

    let tex = gl.gen_texture();
    gl.bind_texture(GL_TEXTURE_2D, tex);
    gl.tex_image_2d(GL_TEXTURE_2D, GL_RGBA as GLint, 8, 8, GL_RGBA, GL_UNSIGNED_BYTE, None);
    gl.framebuffer_texture_2d(GL_FRAMEBUFFER, GL_COLOR_ATTACHMENT0, GL_TEXTURE_2D, tex);
    assert_eq!(gl.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_COMPLETE);

    gl.force_framebuffer_status(Some(GL_FRAMEBUFFER_UNSUPPORTED));
    assert_eq!(gl.check_framebuffer_status(GL_FRAMEBUFFER), GL_FRAMEBUFFER_UNSUPPORTED);
}

#[test]
fn test_linked_program_exposes_declared_locations() {
    let mut gl = MockGl::desktop();
    let vs = gl.create_shader(GL_VERTEX_SHADER);
    gl.shader_source(vs, "attribute vec4 position;\nattribute vec4 color;\nuniform mat4 projection;\n");
    gl.compile_shader(vs);
    let fs = gl.create_shader(GL_FRAGMENT_SHADER);
    gl.shader_source(fs, "uniform lowp sampler2D texture;\n");
    gl.compile_shader(fs);

    let program = gl.create_program();
    gl.attach_shader(program, vs);
    gl.attach_shader(program, fs);
    gl.link_program(program);

    assert_eq!(gl.get_attrib_location(program, "position"), 0);
    assert_eq!(gl.get_attrib_location(program, "color"), 1);
    assert_eq!(gl.get_attrib_location(program, "texcoord"), -1);
    assert_eq!(gl.get_uniform_location(program, "projection"), 0);
    assert_eq!(gl.get_uniform_location(program, "texture"), 1);
}

#[test]
fn test_es2_rejects_fixed_function_calls() {
    let mut gl = MockGl::es2();
    gl.tex_env_i(GL_TEXTURE_ENV, GL_TEXTURE_ENV_MODE, GL_MODULATE);
    assert_eq!(gl.get_error(), GL_INVALID_OPERATION);
    assert!(gl.state().tex_env.is_empty());
}

#[test]
fn test_sub_image_honors_row_length_and_bgra() {
    let mut gl = MockGl::desktop();
    let tex = gl.gen_texture();
    gl.bind_texture(GL_TEXTURE_2D, tex);
    gl.tex_image_2d(GL_TEXTURE_2D, GL_RGBA as GLint, 2, 1, GL_RGBA, GL_UNSIGNED_BYTE, None);

    // Two source rows of 3 pixels, only the first 2 pixels of row 0 are used
    let src: Vec<u8> = vec![
        1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0,
        9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9, 9,
    ];
    gl.pixel_store_i(GL_UNPACK_ROW_LENGTH, 3);
    gl.tex_sub_image_2d(GL_TEXTURE_2D, 0, 0, 2, 1, GL_BGRA, GL_UNSIGNED_BYTE, &src);

    assert_eq!(gl.state().textures[&tex].pixels, vec![3, 2, 1, 4, 7, 6, 5, 8]);
}
