//! Unit tests for error.rs
//!
//! Tests Error Display output, the Result alias and the error macros.

use crate::error::{Error, Result};
use crate::log::{LogEntry, LogSeverity, Logger};
use crate::portgfx::Engine;
use serial_test::serial;
use std::sync::{Arc, Mutex};

// ============================================================================
// DISPLAY TESTS
// ============================================================================

#[test]
fn test_error_display_backend() {
    let err = Error::BackendError("glBindTexture failed".to_string());
    assert_eq!(format!("{}", err), "Backend error: glBindTexture failed");
}

#[test]
fn test_error_display_allocation_failed() {
    let err = Error::AllocationFailed("4096x4096 exceeds 2048".to_string());
    assert_eq!(format!("{}", err), "Allocation failed: 4096x4096 exceeds 2048");
}

#[test]
fn test_error_display_capability_unsupported() {
    let err = Error::CapabilityUnsupported("framebuffers".to_string());
    assert_eq!(format!("{}", err), "Capability unsupported: framebuffers");
}

#[test]
fn test_error_display_incomplete_framebuffer() {
    let err = Error::IncompleteFramebuffer("status 0x8cd6".to_string());
    assert!(format!("{}", err).starts_with("Incomplete framebuffer"));
    assert!(format!("{}", err).contains("0x8cd6"));
}

#[test]
fn test_error_display_invalid_handle_and_init() {
    let err = Error::InvalidHandle("texture".to_string());
    assert_eq!(format!("{}", err), "Invalid handle: texture");

    let err = Error::InitializationFailed("no context".to_string());
    assert_eq!(format!("{}", err), "Initialization failed: no context");
}

#[test]
fn test_error_clone_and_eq() {
    let err = Error::AllocationFailed("x".to_string());
    assert_eq!(err.clone(), err);
    assert_ne!(err, Error::BackendError("x".to_string()));
}

#[test]
fn test_error_is_std_error() {
    fn takes_std_error(_: &dyn std::error::Error) {}
    takes_std_error(&Error::InvalidHandle("h".to_string()));
}

// ============================================================================
// RESULT TYPE TESTS
// ============================================================================

#[test]
fn test_error_propagation_with_question_mark() {
    fn inner() -> Result<u32> {
        Err(Error::InvalidHandle("stale".to_string()))
    }

    fn outer() -> Result<u32> {
        let v = inner()?;
        Ok(v + 1)
    }

    assert_eq!(outer(), Err(Error::InvalidHandle("stale".to_string())));
}

// ============================================================================
// MACRO TESTS
// ============================================================================

struct CaptureLogger {
    entries: Arc<Mutex<Vec<(LogSeverity, String, bool)>>>,
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push((
            entry.severity,
            entry.message.clone(),
            entry.file.is_some() && entry.line.is_some(),
        ));
    }
}

fn capture() -> Arc<Mutex<Vec<(LogSeverity, String, bool)>>> {
    let entries = Arc::new(Mutex::new(Vec::new()));
    Engine::set_logger(CaptureLogger { entries: entries.clone() });
    entries
}

#[test]
#[serial]
fn test_engine_err_defaults_to_backend_error() {
    let entries = capture();

    let err = crate::engine_err!("portgfx::test", "code 0x{:04x}", 0x0502);
    assert_eq!(err, Error::BackendError("code 0x0502".to_string()));

    let entries = entries.lock().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, LogSeverity::Error);
    assert_eq!(entries[0].1, "code 0x0502");
    assert!(entries[0].2, "engine_err! must record file:line");
    drop(entries);
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_err_with_kind() {
    let _entries = capture();

    let err = crate::engine_err!("portgfx::test", AllocationFailed => "{}x{}", 8192, 8192);
    assert_eq!(err, Error::AllocationFailed("8192x8192".to_string()));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_bail_returns_early() {
    let _entries = capture();

    fn fails(flag: bool) -> Result<u32> {
        if flag {
            crate::engine_bail!("portgfx::test", InvalidHandle => "stale key");
        }
        Ok(7)
    }

    assert_eq!(fails(false), Ok(7));
    assert_eq!(fails(true), Err(Error::InvalidHandle("stale key".to_string())));
    Engine::reset_logger();
}

#[test]
#[serial]
fn test_engine_warn_err_logs_at_warn() {
    let entries = capture();

    let err = crate::engine_warn_err!("portgfx::test", CapabilityUnsupported => "no fbo");
    assert_eq!(err, Error::CapabilityUnsupported("no fbo".to_string()));
    assert_eq!(entries.lock().unwrap()[0].0, LogSeverity::Warn);
    Engine::reset_logger();
}
