//! Unit tests for the mock backend bookkeeping

use crate::graphics::mock_backend::MockBackend;
use crate::error::Error;
use crate::graphics::GraphicsBackend;
use std::sync::{Arc, Mutex};

#[test]
fn test_mock_refcount_and_release_callback() {
    let mut backend = MockBackend::new();
    let released = Arc::new(Mutex::new(Vec::new()));

    let tex = backend.create_texture(16, 16, false).unwrap();
    let sink = released.clone();
    backend
        .set_texture_release_callback(tex, Box::new(move |id| sink.lock().unwrap().push(id)))
        .unwrap();

    backend.texture_add_ref(tex).unwrap();
    backend.texture_release(tex).unwrap();
    assert!(released.lock().unwrap().is_empty());

    backend.texture_release(tex).unwrap();
    assert_eq!(*released.lock().unwrap(), vec![tex]);
    assert!(matches!(backend.texture_info(tex), Err(Error::InvalidHandle(_))));
}

#[test]
fn test_mock_shutdown_is_idempotent() {
    let mut backend = MockBackend::new();
    let log = backend.command_log();
    backend.shutdown();
    backend.shutdown();
    let count = log.lock().unwrap().iter().filter(|c| *c == "shutdown").count();
    assert_eq!(count, 1);
}
