//! Reporting of worker failures.

use crate::error::StreamError;

/// Trait for reporting worker errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a worker.
    fn report(&self, worker: &str, error: &StreamError);
}

/// Reporter that logs through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, worker: &str, error: &StreamError) {
        log::error!("[{}] {}", worker, error);
    }
}
