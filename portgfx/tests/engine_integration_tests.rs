//! Integration tests for the Engine singleton with the OpenGL backend
//!
//! These tests register a `GlRenderer` driven by `MockGl` and reach it through
//! `Engine::backend()`, the way the drawing layer does. No GPU required.
//!
//! Run with: cargo test --test engine_integration_tests

use portgfx::portgfx::graphics::{ClearFlags, Rect};
use portgfx::portgfx::{Engine, Error};
use portgfx::glam::Vec4;
use portgfx_renderer_gl::{GlConfig, GlRenderer, MockGl};
use serial_test::serial;

fn mock_renderer() -> (MockGl, GlRenderer) {
    let gl = MockGl::desktop();
    let renderer = GlRenderer::new(Box::new(gl.clone()), GlConfig::default()).unwrap();
    (gl, renderer)
}

/// Integration tests cannot call `reset_for_testing`, start from a clean slot
fn fresh_engine() {
    Engine::initialize().unwrap();
    Engine::destroy_backend().unwrap();
}

// ============================================================================
// LIFECYCLE
// ============================================================================

#[test]
#[serial]
fn test_integration_create_and_use_backend() {
    fresh_engine();
    let (gl, renderer) = mock_renderer();

    Engine::create_backend(renderer).unwrap();
    {
        let backend = Engine::backend().unwrap();
        let mut backend = backend.lock().unwrap();
        backend.set_viewport(Rect::new(0, 0, 320, 240));
        backend.clear_color(Vec4::new(0.0, 0.0, 1.0, 1.0));
        backend.clear(ClearFlags::COLOR);
    }

    let state = gl.state();
    assert_eq!(state.viewport, Some([0, 0, 320, 240]));
    assert_eq!(state.framebuffer_colors.get(&0), Some(&[0.0, 0.0, 1.0, 1.0]));
    drop(state);

    Engine::destroy_backend().unwrap();
}

#[test]
#[serial]
fn test_integration_second_backend_rejected() {
    fresh_engine();
    let (_gl1, first) = mock_renderer();
    let (_gl2, second) = mock_renderer();

    Engine::create_backend(first).unwrap();
    let result = Engine::create_backend(second);

    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    Engine::destroy_backend().unwrap();
}

#[test]
#[serial]
fn test_integration_destroy_backend_releases_gl_objects() {
    fresh_engine();
    let (gl, renderer) = mock_renderer();
    Engine::create_backend(renderer).unwrap();
    {
        let backend = Engine::backend().unwrap();
        let mut backend = backend.lock().unwrap();
        backend.create_texture(64, 64, true).unwrap();
        backend.create_renderbuffer(64, 64).unwrap();
    }
    assert!(gl.state().textures.len() > 1);

    Engine::destroy_backend().unwrap();

    let state = gl.state();
    assert!(state.textures.is_empty());
    assert!(state.renderbuffers.is_empty());
    assert!(state.programs.is_empty());
    drop(state);
    assert!(Engine::backend().is_err());
}

#[test]
#[serial]
fn test_integration_shutdown_then_recreate() {
    fresh_engine();
    let (_gl1, first) = mock_renderer();
    Engine::create_backend(first).unwrap();

    Engine::shutdown();
    assert!(Engine::backend().is_err());

    Engine::initialize().unwrap();
    let (gl2, second) = mock_renderer();
    Engine::create_backend(second).unwrap();
    {
        let backend = Engine::backend().unwrap();
        let mut backend = backend.lock().unwrap();
        backend.start_frame().unwrap();
        backend.end_frame().unwrap();
    }
    assert!(gl2.state().errors.is_empty());

    Engine::destroy_backend().unwrap();
}

#[test]
#[serial]
fn test_integration_destroy_without_backend_is_noop() {
    fresh_engine();

    assert!(Engine::destroy_backend().is_ok());
    assert!(Engine::destroy_backend().is_ok());
}
