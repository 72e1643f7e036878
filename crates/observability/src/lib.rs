//! Tracing, logging and fatal-error reporting (shared setup).

/// Initialize process-wide observability (tracing/logging).
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init();
}

/// Tracing configuration (filters, output format).
pub mod tracing;

/// Global handler for unrecoverable errors and panics.
pub mod fatal;

pub use self::fatal::{GlobalErrorHandler, install_panic_hook};
pub use self::tracing::LogFormat;
