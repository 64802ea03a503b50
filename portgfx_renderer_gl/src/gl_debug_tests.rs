//! Unit tests for GL error tracking
//!
//! The counters are process-wide, so these tests are #[serial].

use crate::gl_api::*;
use crate::gl_debug::{check_errors, clear_errors, gl_error_stats, reset_gl_error_stats};
use crate::mock_gl::MockGl;
use serial_test::serial;

fn raise(gl: &mut MockGl, code: GLenum) {
    gl.fail_call("glFinish", code);
    gl.finish();
}

#[test]
#[serial]
fn test_check_errors_counts_by_code() {
    reset_gl_error_stats();
    let mut gl = MockGl::desktop();

    raise(&mut gl, GL_INVALID_ENUM);
    raise(&mut gl, GL_OUT_OF_MEMORY);
    raise(&mut gl, GL_OUT_OF_MEMORY);

    assert_eq!(check_errors(&mut gl, "finish"), 3);
    let stats = gl_error_stats();
    assert_eq!(stats.invalid_enum, 1);
    assert_eq!(stats.out_of_memory, 2);
    assert_eq!(stats.total(), 3);

    assert_eq!(check_errors(&mut gl, "finish"), 0);
    reset_gl_error_stats();
}

#[test]
#[serial]
fn test_clear_errors_does_not_count() {
    reset_gl_error_stats();
    let mut gl = MockGl::desktop();

    raise(&mut gl, GL_INVALID_VALUE);
    clear_errors(&mut gl);

    assert_eq!(gl.get_error(), GL_NO_ERROR);
    assert_eq!(gl_error_stats().total(), 0);
}

#[test]
#[serial]
fn test_unknown_codes_count_as_other() {
    reset_gl_error_stats();
    let mut gl = MockGl::desktop();

    raise(&mut gl, 0x9999);
    check_errors(&mut gl, "finish");

    assert_eq!(gl_error_stats().other, 1);
    assert_eq!(gl_error_name(0x9999), "GL_UNKNOWN_ERROR");
    reset_gl_error_stats();
}
