//! Error types for the portgfx backend layer
//!
//! Every fallible backend operation returns [`Result`]. None of these errors are
//! fatal: callers are expected to drop the resource involved and retry or
//! degrade (for example by drawing untextured).

use std::fmt;

/// Result type for portgfx operations
pub type Result<T> = std::result::Result<T, Error>;

/// portgfx errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Native call failed or returned an unexpected state
    BackendError(String),

    /// Native object creation failed (out of texture memory, size above the
    /// device limit, unsupported format)
    AllocationFailed(String),

    /// Operation needs a capability the active context does not expose
    /// (framebuffers, renderbuffers, VBOs, shaders)
    CapabilityUnsupported(String),

    /// The driver rejected the attachment combination of a framebuffer
    IncompleteFramebuffer(String),

    /// Stale or foreign resource key
    InvalidHandle(String),

    /// Engine or backend initialization failed
    InitializationFailed(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::AllocationFailed(msg) => write!(f, "Allocation failed: {}", msg),
            Error::CapabilityUnsupported(msg) => write!(f, "Capability unsupported: {}", msg),
            Error::IncompleteFramebuffer(msg) => write!(f, "Incomplete framebuffer: {}", msg),
            Error::InvalidHandle(msg) => write!(f, "Invalid handle: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// ===== ERROR MACROS =====

/// Log an ERROR with file:line and build an [`Error`]
///
/// Without a kind the error is an `Error::BackendError`. A kind is given as the
/// variant name followed by `=>`.
///
/// # Example
///
/// ```no_run
/// use portgfx::engine_err;
///
/// let e = engine_err!("portgfx::gl", "glGenTextures failed: 0x{:04x}", 0x0505);
/// let e = engine_err!("portgfx::gl::Texture", InvalidHandle => "texture {:?} released", 3);
/// ```
#[macro_export]
macro_rules! engine_err {
    ($source:expr, $kind:ident => $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::portgfx::Engine::log_detailed(
            $crate::portgfx::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::portgfx::Error::$kind(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_err!($source, BackendError => $($arg)*)
    };
}

/// Log an ERROR with file:line and return the matching `Err` from the
/// enclosing function
///
/// Accepts the same forms as [`engine_err!`].
#[macro_export]
macro_rules! engine_bail {
    ($($arg:tt)*) => {
        return Err($crate::engine_err!($($arg)*))
    };
}

/// Like [`engine_err!`] but logs at WARN severity
///
/// Used for failures the caller routinely recovers from (capability probes,
/// stale keys during teardown).
#[macro_export]
macro_rules! engine_warn_err {
    ($source:expr, $kind:ident => $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::portgfx::Engine::log_detailed(
            $crate::portgfx::log::LogSeverity::Warn,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::portgfx::Error::$kind(message)
    }};
    ($source:expr, $($arg:tt)*) => {
        $crate::engine_warn_err!($source, BackendError => $($arg)*)
    };
}

/// Log a WARN and return the matching `Err` from the enclosing function
#[macro_export]
macro_rules! engine_bail_warn {
    ($($arg:tt)*) => {
        return Err($crate::engine_warn_err!($($arg)*))
    };
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
