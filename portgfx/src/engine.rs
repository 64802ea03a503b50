/// portgfx Engine - singleton owner of the active graphics backend and logger
///
/// The backend lives behind `Arc<Mutex<dyn GraphicsBackend>>` in a global
/// `OnceLock`, so the upper drawing layer can reach it from anywhere without
/// threading a context through every call.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, RwLock};
use crate::error::{Error, Result};
use crate::graphics::GraphicsBackend;
use crate::log::{DefaultLogger, LogEntry, LogSeverity, Logger};

// ===== INTERNAL STATE =====

/// Global engine state storage
static ENGINE_STATE: OnceLock<EngineState> = OnceLock::new();

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Minimum severity forwarded to the logger
static LOG_LEVEL: AtomicU8 = AtomicU8::new(0);

struct EngineState {
    backend: RwLock<Option<Arc<Mutex<dyn GraphicsBackend>>>>,
}

impl EngineState {
    fn new() -> Self {
        Self {
            backend: RwLock::new(None),
        }
    }
}

fn severity_rank(severity: LogSeverity) -> u8 {
    match severity {
        LogSeverity::Trace => 0,
        LogSeverity::Debug => 1,
        LogSeverity::Info => 2,
        LogSeverity::Warn => 3,
        LogSeverity::Error => 4,
    }
}

fn rank_severity(rank: u8) -> LogSeverity {
    match rank {
        0 => LogSeverity::Trace,
        1 => LogSeverity::Debug,
        2 => LogSeverity::Info,
        3 => LogSeverity::Warn,
        _ => LogSeverity::Error,
    }
}

// ===== PUBLIC API =====

/// Engine singleton manager
///
/// # Example
///
/// ```no_run
/// use portgfx::portgfx::Engine;
///
/// Engine::initialize()?;
/// // Engine::create_backend(GlRenderer::new(Box::new(gl), GlConfig::default())?)?;
/// let backend = Engine::backend()?;
/// backend.lock().unwrap().finish();
/// Engine::shutdown();
/// # Ok::<(), portgfx::portgfx::Error>(())
/// ```
pub struct Engine;

impl Engine {
    /// Log an Engine error before returning it
    fn log_and_return_error(error: Error) -> Error {
        crate::engine_error!("portgfx::Engine", "{}", error);
        error
    }

    fn state() -> Result<&'static EngineState> {
        ENGINE_STATE.get().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Engine not initialized. Call Engine::initialize() first.".to_string(),
            ))
        })
    }

    /// Initialize the engine (idempotent)
    pub fn initialize() -> Result<()> {
        ENGINE_STATE.get_or_init(EngineState::new);
        Ok(())
    }

    /// Shut the active backend down and drop it
    ///
    /// `initialize()` stays valid afterwards; a new backend can be created.
    pub fn shutdown() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut lock) = state.backend.write() {
                if let Some(backend) = lock.take() {
                    if let Ok(mut backend) = backend.lock() {
                        backend.shutdown();
                    }
                }
            }
        }
    }

    /// Register `backend` as the active backend
    ///
    /// # Errors
    ///
    /// - the engine is not initialized
    /// - a backend already exists
    /// - the backend lock is poisoned
    pub fn create_backend<B: GraphicsBackend + 'static>(backend: B) -> Result<()> {
        let backend: Arc<Mutex<dyn GraphicsBackend>> = Arc::new(Mutex::new(backend));
        let state = Self::state()?;

        let mut lock = state.backend.write().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Backend lock poisoned".to_string()))
        })?;

        if lock.is_some() {
            return Err(Self::log_and_return_error(Error::InitializationFailed(
                "Backend already exists. Call Engine::destroy_backend() first.".to_string(),
            )));
        }

        *lock = Some(backend);
        crate::engine_info!("portgfx::Engine", "Graphics backend registered");
        Ok(())
    }

    /// The active backend
    ///
    /// # Errors
    ///
    /// - the engine is not initialized
    /// - no backend has been created
    pub fn backend() -> Result<Arc<Mutex<dyn GraphicsBackend>>> {
        let state = Self::state()?;
        let lock = state.backend.read().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Backend lock poisoned".to_string()))
        })?;

        lock.clone().ok_or_else(|| {
            Self::log_and_return_error(Error::InitializationFailed(
                "Backend not created. Call Engine::create_backend() first.".to_string(),
            ))
        })
    }

    /// Shut down and remove the active backend (no-op when none exists)
    pub fn destroy_backend() -> Result<()> {
        let state = Self::state()?;
        let mut lock = state.backend.write().map_err(|_| {
            Self::log_and_return_error(Error::BackendError("Backend lock poisoned".to_string()))
        })?;

        if let Some(backend) = lock.take() {
            let mut backend = backend.lock().map_err(|_| {
                Self::log_and_return_error(Error::BackendError("Backend mutex poisoned".to_string()))
            })?;
            backend.shutdown();
            crate::engine_info!("portgfx::Engine", "Graphics backend destroyed");
        }
        Ok(())
    }

    /// Reset all singletons for testing (only available in test builds)
    #[cfg(test)]
    pub fn reset_for_testing() {
        if let Some(state) = ENGINE_STATE.get() {
            if let Ok(mut backend) = state.backend.write() {
                *backend = None;
            }
        }
        LOG_LEVEL.store(0, Ordering::Relaxed);
    }

    // ===== LOGGING API =====

    /// Replace the logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(logger);
        }
    }

    /// Back to `DefaultLogger`
    pub fn reset_logger() {
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(mut lock) = logger_lock.write() {
            *lock = Box::new(DefaultLogger);
        }
    }

    /// Drop entries below `severity`
    pub fn set_log_level(severity: LogSeverity) {
        LOG_LEVEL.store(severity_rank(severity), Ordering::Relaxed);
    }

    pub fn log_level() -> LogSeverity {
        rank_severity(LOG_LEVEL.load(Ordering::Relaxed))
    }

    fn dispatch(entry: LogEntry) {
        if severity_rank(entry.severity) < LOG_LEVEL.load(Ordering::Relaxed) {
            return;
        }
        let logger_lock = LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger)));
        if let Ok(lock) = logger_lock.read() {
            lock.log(&entry);
        }
    }

    /// Log without location (used by `engine_info!` and friends)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        Self::dispatch(LogEntry::new(severity, source, message));
    }

    /// Log with file:line (used by `engine_error!` and the error macros)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        Self::dispatch(LogEntry::new(severity, source, message).at(file, line));
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
