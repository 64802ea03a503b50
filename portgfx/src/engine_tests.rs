//! Unit tests for the Engine singleton
//!
//! ENGINE_STATE and LOGGER are process-wide, so every test is #[serial].

use crate::graphics::mock_backend::MockBackend;
use crate::graphics::{ClearFlags, GraphicsBackend};
use crate::log::{LogEntry, LogSeverity, Logger};
use crate::portgfx::{Engine, Error};
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// TEST HELPERS
// ============================================================================

struct TestLogger {
    entries: Arc<Mutex<Vec<String>>>,
}

impl Logger for TestLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries
            .lock()
            .unwrap()
            .push(format!("{:?}: {}", entry.severity, entry.message));
    }
}

fn capture_logs() -> Arc<Mutex<Vec<String>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(TestLogger { entries: entries.clone() });
    entries
}

fn setup() {
    Engine::reset_for_testing();
    let _ = Engine::initialize();
}

// ============================================================================
// INITIALIZATION AND SHUTDOWN TESTS
// ============================================================================

#[test]
#[serial]
fn test_engine_initialize_is_idempotent() {
    setup();
    assert!(Engine::initialize().is_ok());
    assert!(Engine::initialize().is_ok());
}

#[test]
#[serial]
fn test_create_and_access_backend() {
    setup();
    let backend = MockBackend::new();
    let log = backend.command_log();

    Engine::create_backend(backend).unwrap();
    {
        let backend = Engine::backend().unwrap();
        let mut guard = backend.lock().unwrap();
        guard.clear(ClearFlags::COLOR);
        assert!(guard.capabilities().has_framebuffer_support);
    }

    assert_eq!(log.lock().unwrap().last().unwrap(), &format!("clear {:?}", ClearFlags::COLOR));
    Engine::destroy_backend().unwrap();
}

#[test]
#[serial]
fn test_create_backend_twice_fails() {
    setup();
    let _entries = capture_logs();

    Engine::create_backend(MockBackend::new()).unwrap();
    let result = Engine::create_backend(MockBackend::new());
    assert!(matches!(result, Err(Error::InitializationFailed(_))));

    Engine::destroy_backend().unwrap();
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_backend_missing_is_an_error() {
    setup();
    let entries = capture_logs();

    let result = Engine::backend();
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
    assert!(entries.lock().unwrap().iter().any(|e| e.starts_with("Error")));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_destroy_backend_runs_shutdown() {
    setup();
    let backend = MockBackend::new();
    let log = backend.command_log();

    Engine::create_backend(backend).unwrap();
    Engine::destroy_backend().unwrap();

    assert_eq!(log.lock().unwrap().last().unwrap(), "shutdown");
    assert!(Engine::backend().is_err());

    // Nothing left to destroy
    assert!(Engine::destroy_backend().is_ok());
}

#[test]
#[serial]
fn test_engine_shutdown_shuts_backend_down() {
    setup();
    let backend = MockBackend::new();
    let log = backend.command_log();

    Engine::create_backend(backend).unwrap();
    Engine::shutdown();

    assert!(log.lock().unwrap().iter().any(|c| c == "shutdown"));
    assert!(Engine::backend().is_err());
    Engine::initialize().unwrap();
}

// ============================================================================
// LOGGING TESTS
// ============================================================================

#[test]
#[serial]
fn test_custom_logger_receives_entries() {
    setup();
    let entries = capture_logs();

    Engine::log(LogSeverity::Info, "portgfx::test", "hello".to_string());
    crate::engine_warn!("portgfx::test", "warned {}", 1);

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0], "Info: hello");
    assert_eq!(entries[1], "Warn: warned 1");
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_log_level_filters_lower_severities() {
    setup();
    let entries = capture_logs();

    Engine::set_log_level(LogSeverity::Warn);
    assert_eq!(Engine::log_level(), LogSeverity::Warn);

    crate::engine_debug!("portgfx::test", "dropped");
    crate::engine_info!("portgfx::test", "dropped");
    crate::engine_warn!("portgfx::test", "kept");
    crate::engine_error!("portgfx::test", "kept too");

    assert_eq!(entries.lock().unwrap().len(), 2);

    Engine::set_log_level(LogSeverity::Trace);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_backend_usable_through_trait_object() {
    setup();
    Engine::create_backend(MockBackend::new()).unwrap();

    let backend = Engine::backend().unwrap();
    let id = backend.lock().unwrap().create_texture(8, 8, true).unwrap();
    assert!(backend.lock().unwrap().texture_has_alpha(id));
    backend.lock().unwrap().texture_release(id).unwrap();
    assert!(!backend.lock().unwrap().texture_has_alpha(id));

    Engine::destroy_backend().unwrap();
}

#[test]
fn test_backend_trait_object_is_send() {
    fn assert_send<T: Send + ?Sized>() {}
    assert_send::<dyn GraphicsBackend>();
}
