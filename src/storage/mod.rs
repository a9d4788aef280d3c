//! Delimited-text storage for labeled records.
//!
//! [`PersistedStream`] appends records; [`RecordedStream`] reads them back for
//! replay. Both share one format: a header row of field names followed by one
//! comma-separated row per record.

pub mod persisted;
pub mod recorded;

pub use persisted::PersistedStream;
pub use recorded::RecordedStream;

/// Column separator.
pub const DELIMITER: char = ',';
