/// GL error tracking - drains glGetError and keeps process-wide statistics
///
/// The renderer calls `check_errors` after dispatched operations when the
/// `gl-debug` feature is enabled. Statistics are atomic counters, readable at
/// any time and printed with colored output by `print_gl_error_report`.

use colored::*;
use std::sync::atomic::{AtomicU32, Ordering};
use portgfx::engine_warn;
use crate::gl_api::*;

/// Global error statistics (thread-safe atomic counters)
static GL_ERROR_STATS: GlErrorStatsTracker = GlErrorStatsTracker::new();

/// Upper bound on glGetError calls per check (a lost context can report
/// errors forever)
const MAX_ERRORS_PER_CHECK: usize = 16;

/// Snapshot of the error counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlErrorStats {
    pub invalid_enum: u32,
    pub invalid_value: u32,
    pub invalid_operation: u32,
    pub out_of_memory: u32,
    pub invalid_framebuffer_operation: u32,
    pub other: u32,
}

impl GlErrorStats {
    pub fn total(&self) -> u32 {
        self.invalid_enum
            + self.invalid_value
            + self.invalid_operation
            + self.out_of_memory
            + self.invalid_framebuffer_operation
            + self.other
    }
}

struct GlErrorStatsTracker {
    invalid_enum: AtomicU32,
    invalid_value: AtomicU32,
    invalid_operation: AtomicU32,
    out_of_memory: AtomicU32,
    invalid_framebuffer_operation: AtomicU32,
    other: AtomicU32,
}

impl GlErrorStatsTracker {
    const fn new() -> Self {
        Self {
            invalid_enum: AtomicU32::new(0),
            invalid_value: AtomicU32::new(0),
            invalid_operation: AtomicU32::new(0),
            out_of_memory: AtomicU32::new(0),
            invalid_framebuffer_operation: AtomicU32::new(0),
            other: AtomicU32::new(0),
        }
    }

    fn record(&self, code: GLenum) {
        let counter = match code {
            GL_INVALID_ENUM => &self.invalid_enum,
            GL_INVALID_VALUE => &self.invalid_value,
            GL_INVALID_OPERATION => &self.invalid_operation,
            GL_OUT_OF_MEMORY => &self.out_of_memory,
            GL_INVALID_FRAMEBUFFER_OPERATION => &self.invalid_framebuffer_operation,
            _ => &self.other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> GlErrorStats {
        GlErrorStats {
            invalid_enum: self.invalid_enum.load(Ordering::Relaxed),
            invalid_value: self.invalid_value.load(Ordering::Relaxed),
            invalid_operation: self.invalid_operation.load(Ordering::Relaxed),
            out_of_memory: self.out_of_memory.load(Ordering::Relaxed),
            invalid_framebuffer_operation: self.invalid_framebuffer_operation.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        self.invalid_enum.store(0, Ordering::Relaxed);
        self.invalid_value.store(0, Ordering::Relaxed);
        self.invalid_operation.store(0, Ordering::Relaxed);
        self.out_of_memory.store(0, Ordering::Relaxed);
        self.invalid_framebuffer_operation.store(0, Ordering::Relaxed);
        self.other.store(0, Ordering::Relaxed);
    }
}

/// Drain pending GL errors, log each one against `operation` and count it
///
/// Returns the number of errors drained.
pub fn check_errors(gl: &mut dyn GlApi, operation: &str) -> usize {
    let mut drained = 0;
    while drained < MAX_ERRORS_PER_CHECK {
        let code = gl.get_error();
        if code == GL_NO_ERROR {
            break;
        }
        GL_ERROR_STATS.record(code);
        engine_warn!("portgfx::gl::Debug", "{} raised {} (0x{:04x})", operation, gl_error_name(code), code);
        drained += 1;
    }
    drained
}

/// Drain pending GL errors without recording them
///
/// Used before an operation that checks its own errors.
pub(crate) fn clear_errors(gl: &mut dyn GlApi) {
    for _ in 0..MAX_ERRORS_PER_CHECK {
        if gl.get_error() == GL_NO_ERROR {
            break;
        }
    }
}

/// Current error statistics
pub fn gl_error_stats() -> GlErrorStats {
    GL_ERROR_STATS.snapshot()
}

pub fn reset_gl_error_stats() {
    GL_ERROR_STATS.reset();
}

/// Print the error statistics report
pub fn print_gl_error_report() {
    let stats = gl_error_stats();

    if stats.total() == 0 {
        println!("\n{}", "✓ No GL errors".green().bold());
        return;
    }

    println!("\n{}", "=== GL Error Report ===".bright_blue().bold());

    let rows = [
        ("GL_INVALID_ENUM:", stats.invalid_enum),
        ("GL_INVALID_VALUE:", stats.invalid_value),
        ("GL_INVALID_OPERATION:", stats.invalid_operation),
        ("GL_OUT_OF_MEMORY:", stats.out_of_memory),
        ("GL_INVALID_FRAMEBUFFER_OPERATION:", stats.invalid_framebuffer_operation),
        ("Other:", stats.other),
    ];
    for (label, count) in rows {
        if count > 0 {
            println!("  {} {}", label.red().bold(), count);
        }
    }

    println!("  {} {}", "Total:".white().bold(), stats.total());
    println!("{}\n", "=======================".bright_blue().bold());
}

#[cfg(test)]
#[path = "gl_debug_tests.rs"]
mod tests;
