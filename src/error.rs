//! Error types for thoughtstream.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    // Configuration errors
    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Source errors
    #[error("Source unavailable: {message}")]
    SourceUnavailable { message: String },

    #[error("Device error: {message}")]
    Device { message: String },

    #[error("Recorded stream malformed at line {line}: {message}")]
    ReplayFormat { line: usize, message: String },

    // Transcoding errors
    #[error("Frame schema mismatch: expected {expected} channel rows, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    // Persistence errors
    #[error("Failed to append to {}: {source}", path.display())]
    PersistenceWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Worker errors
    #[error("Producer crashed: {message}")]
    ProducerCrash { message: String },

    #[error("Consumer crashed: {message}")]
    ConsumerCrash { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// True when the error was caused by the producing side going away
    /// rather than by the consumer itself.
    pub fn is_producer_crash(&self) -> bool {
        matches!(self, StreamError::ProducerCrash { .. })
    }
}

pub type Result<T> = std::result::Result<T, StreamError>;
