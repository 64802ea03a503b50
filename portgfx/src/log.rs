//! Logging for the portgfx backend layer
//!
//! - `Logger` trait so the host application can route messages anywhere
//! - Severity levels (Trace, Debug, Info, Warn, Error) with a global minimum
//!   level set through `Engine::set_log_level`
//! - Colored console output by default
//! - File and line information on error-macro entries

use chrono::{DateTime, Local};
use colored::*;
use std::fmt;
use std::time::SystemTime;

/// Logger trait for custom logging implementations
///
/// # Example
///
/// ```no_run
/// use portgfx::portgfx::log::{Logger, LogEntry};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, entry: &LogEntry) {
///         eprintln!("{} {}", entry.source, entry.message);
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// One log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the entry was created
    pub timestamp: SystemTime,

    /// Source tag (e.g. "portgfx::Engine", "portgfx::gl::Texture")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for detailed logs)
    pub file: Option<&'static str>,

    /// Source line (only for detailed logs)
    pub line: Option<u32>,
}

impl LogEntry {
    /// Build an entry stamped with the current time
    pub fn new(severity: LogSeverity, source: &str, message: String) -> Self {
        Self {
            severity,
            timestamp: SystemTime::now(),
            source: source.to_string(),
            message,
            file: None,
            line: None,
        }
    }

    /// Attach a file:line location
    pub fn at(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Per-call tracing of native GL traffic
    Trace,

    /// Development information
    Debug,

    /// Important events (backend created, capabilities detected)
    Info,

    /// Recoverable problems
    Warn,

    /// Failed operations
    Error,
}

impl LogSeverity {
    /// Fixed-width tag used by the console logger
    pub fn tag(self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag().trim_end())
    }
}

/// Default logger using colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Detailed: `[timestamp] [SEVERITY] [source] message (file:line)`
pub struct DefaultLogger;

impl DefaultLogger {
    /// Render an entry without color codes
    pub fn format_plain(entry: &LogEntry) -> String {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f");
        match (entry.file, entry.line) {
            (Some(file), Some(line)) => format!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp,
                entry.severity.tag(),
                entry.source,
                entry.message,
                file,
                line
            ),
            _ => format!(
                "[{}] [{}] [{}] {}",
                timestamp,
                entry.severity.tag(),
                entry.source,
                entry.message
            ),
        }
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let severity_str = match entry.severity {
            LogSeverity::Trace => entry.severity.tag().bright_black(),
            LogSeverity::Debug => entry.severity.tag().cyan(),
            LogSeverity::Info => entry.severity.tag().green(),
            LogSeverity::Warn => entry.severity.tag().yellow(),
            LogSeverity::Error => entry.severity.tag().red().bold(),
        };

        let source = entry.source.bright_blue();

        if let (Some(file), Some(line)) = (entry.file, entry.line) {
            println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            );
        } else {
            println!("[{}] [{}] [{}] {}", timestamp, severity_str, source, entry.message);
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// # Example
///
/// ```no_run
/// portgfx::engine_trace!("portgfx::gl", "glBindTexture({})", 3);
/// ```
#[macro_export]
macro_rules! engine_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::portgfx::Engine::log(
            $crate::portgfx::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! engine_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::portgfx::Engine::log(
            $crate::portgfx::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
///
/// # Example
///
/// ```no_run
/// portgfx::engine_info!("portgfx::gl", "max texture size {}", 4096);
/// ```
#[macro_export]
macro_rules! engine_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::portgfx::Engine::log(
            $crate::portgfx::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! engine_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::portgfx::Engine::log(
            $crate::portgfx::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! engine_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::portgfx::Engine::log_detailed(
            $crate::portgfx::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
