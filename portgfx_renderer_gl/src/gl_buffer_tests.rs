//! Unit tests for vertex/index buffers and the stream pool

use crate::gl_api::*;
use crate::gl_buffer::*;
use crate::mock_gl::MockGl;
use portgfx::portgfx::Error;

// ============================================================================
// Buffer manager
// ============================================================================

#[test]
fn test_vertex_buffer_uploads_initial_data() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(true);
    let data: Vec<u8> = (0..32).collect();

    let id = buffers.create_vertex_buffer(&mut gl, 8, Some(data.as_slice()), 4, true).unwrap();

    let native = buffers.vertex_buffer(id).unwrap().native;
    let state = gl.state();
    assert_eq!(state.buffers[&native].data, data);
    assert_eq!(state.buffers[&native].usage, GL_STATIC_DRAW);
    assert_eq!(state.bound_array_buffer, 0);
}

#[test]
fn test_set_data_writes_at_vertex_offset() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(true);
    let id = buffers.create_vertex_buffer(&mut gl, 4, None, 4, false).unwrap();

    buffers
        .vertex_buffer_set_data(&mut gl, id, &[1, 2, 3, 4, 5, 6, 7, 8], 2, 2, false)
        .unwrap();

    let native = buffers.vertex_buffer(id).unwrap().native;
    let state = gl.state();
    assert_eq!(&state.buffers[&native].data[8..], &[1, 2, 3, 4, 5, 6, 7, 8]);
    assert_eq!(state.buffers[&native].usage, GL_DYNAMIC_DRAW);
}

#[test]
fn test_set_data_with_reset_orphans_storage() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(true);
    let id = buffers.create_vertex_buffer(&mut gl, 4, Some(&[9; 16]), 4, false).unwrap();
    gl.clear_calls();

    buffers.vertex_buffer_set_data(&mut gl, id, &[1; 4], 0, 1, true).unwrap();

    assert!(gl.has_call(&format!("glBufferData({:#06x}, 16, {:#06x})", GL_ARRAY_BUFFER, GL_DYNAMIC_DRAW)));
    assert_eq!(gl.count_calls("glBufferSubData"), 1);
}

#[test]
fn test_set_data_rejects_overflow_and_short_input() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(true);
    let id = buffers.create_vertex_buffer(&mut gl, 4, None, 2, false).unwrap();

    let overflow = buffers.vertex_buffer_set_data(&mut gl, id, &[0; 8], 1, 2, false);
    assert!(matches!(overflow, Err(Error::BackendError(_))));

    let short = buffers.vertex_buffer_set_data(&mut gl, id, &[0; 4], 0, 2, false);
    assert!(matches!(short, Err(Error::BackendError(_))));
}

#[test]
fn test_fallback_storage_without_vbo() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(false);

    let id = buffers.create_index_buffer(&mut gl, Some(&[1, 2, 3]), 3, true).unwrap();
    buffers.index_buffer_set_data(&mut gl, id, &[7], 1, 1, false).unwrap();

    let buffer = buffers.index_buffer(id).unwrap();
    assert_eq!(buffer.native, 0);
    assert_eq!(buffer.fallback, vec![1, 0, 7, 0, 3, 0]);
    assert!(gl.calls().is_empty());
}

#[test]
fn test_empty_buffer_is_allocation_error() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(true);

    let result = buffers.create_vertex_buffer(&mut gl, 16, None, 0, true);

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
}

#[test]
fn test_native_failure_deletes_buffer() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(true);
    gl.fail_call("glBufferData", GL_OUT_OF_MEMORY);

    let result = buffers.create_index_buffer(&mut gl, None, 64, false);

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
    assert!(gl.state().buffers.is_empty());
}

#[test]
fn test_delete_and_stale_keys() {
    let mut gl = MockGl::desktop();
    let mut buffers = BufferManager::new(true);
    let id = buffers.create_vertex_buffer(&mut gl, 4, None, 4, true).unwrap();

    buffers.delete_vertex_buffer(&mut gl, id).unwrap();
    assert!(gl.state().buffers.is_empty());

    let result = buffers.vertex_buffer_set_data(&mut gl, id, &[0; 4], 0, 1, false);
    assert!(matches!(result, Err(Error::InvalidHandle(_))));
    assert!(matches!(buffers.delete_vertex_buffer(&mut gl, id), Err(Error::InvalidHandle(_))));
}

// ============================================================================
// Stream pool
// ============================================================================

#[test]
fn test_stream_bucket_sizes() {
    assert_eq!(stream_bucket(0), Some((5, 32)));
    assert_eq!(stream_bucket(32), Some((5, 32)));
    assert_eq!(stream_bucket(33), Some((6, 64)));
    assert_eq!(stream_bucket(1 << 23), Some((23, 1 << 23)));
    assert_eq!(stream_bucket((1 << 23) + 1), None);
}

#[test]
fn test_stream_reuses_bucket() {
    let mut gl = MockGl::desktop();
    let mut pool = StreamPool::new();

    let a = pool.stream_vertices(&mut gl, &[1; 40], 0).unwrap();
    let b = pool.stream_vertices(&mut gl, &[2; 50], 0).unwrap();

    assert_eq!(a, b);
    assert_eq!(pool.allocated(), 1);
    let state = gl.state();
    assert_eq!(state.buffers[&a].data.len(), 64);
    assert_eq!(state.bound_array_buffer, a);
}

#[test]
fn test_stream_writes_at_offset() {
    let mut gl = MockGl::desktop();
    let mut pool = StreamPool::new();

    let native = pool.stream_vertices(&mut gl, &[5; 8], 24).unwrap();

    let state = gl.state();
    assert_eq!(state.buffers[&native].data.len(), 32);
    assert_eq!(&state.buffers[&native].data[24..], &[5; 8]);
}

#[test]
fn test_stream_indices_use_element_buffer() {
    let mut gl = MockGl::desktop();
    let mut pool = StreamPool::new();

    let native = pool.stream_indices(&mut gl, &[0, 1, 2]).unwrap();

    let state = gl.state();
    assert_eq!(state.bound_element_buffer, native);
    assert_eq!(&state.buffers[&native].data[..6], &[0, 0, 1, 0, 2, 0]);
}

#[test]
fn test_oversize_stream_fails() {
    let mut gl = MockGl::desktop();
    let mut pool = StreamPool::new();
    let huge = vec![0u8; (1 << 23) + 1];

    let result = pool.stream_vertices(&mut gl, &huge, 0);

    assert!(matches!(result, Err(Error::AllocationFailed(_))));
    assert_eq!(pool.allocated(), 0);
}

#[test]
fn test_stream_cleanup_deletes_buffers() {
    let mut gl = MockGl::desktop();
    let mut pool = StreamPool::new();
    pool.stream_vertices(&mut gl, &[0; 10], 0).unwrap();
    pool.stream_indices(&mut gl, &[0; 100]).unwrap();

    pool.cleanup(&mut gl);

    assert_eq!(pool.allocated(), 0);
    assert!(gl.state().buffers.is_empty());
}
