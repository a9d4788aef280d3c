//! Append-only record file.

use crate::error::{Result, StreamError};
use crate::pipeline::schema::FIELD_NAMES;
use crate::pipeline::types::LabeledRecord;
use crate::storage::DELIMITER;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only record store.
///
/// The file is opened on the first non-empty batch. A header row is written
/// only if the file did not exist at that moment; an existing file is
/// appended to, never truncated.
#[derive(Debug)]
pub struct PersistedStream {
    path: PathBuf,
    file: Option<File>,
    rows_written: u64,
}

impl PersistedStream {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
            rows_written: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written through this handle.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Appends one batch as a single write.
    pub fn append(&mut self, records: &[LabeledRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut buf = String::with_capacity((records.len() + 1) * FIELD_NAMES.len() * 8);

        if self.file.is_none() {
            let existed = self.path.exists();
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|source| StreamError::PersistenceWriteFailure {
                    path: self.path.clone(),
                    source,
                })?;
            if !existed {
                push_header(&mut buf);
                log::debug!("created {}", self.path.display());
            }
            self.file = Some(file);
        }

        for record in records {
            push_row(&mut buf, record.values());
        }

        if let Some(file) = self.file.as_mut() {
            file.write_all(buf.as_bytes())
                .and_then(|()| file.flush())
                .map_err(|source| StreamError::PersistenceWriteFailure {
                    path: self.path.clone(),
                    source,
                })?;
        }

        self.rows_written += records.len() as u64;
        Ok(())
    }
}

fn push_header(buf: &mut String) {
    for (i, name) in FIELD_NAMES.iter().enumerate() {
        if i > 0 {
            buf.push(DELIMITER);
        }
        buf.push_str(name);
    }
    buf.push('\n');
}

/// Shortest round-trip formatting, so a replayed file reproduces its source.
fn push_row(buf: &mut String, values: &[f64]) {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            buf.push(DELIMITER);
        }
        buf.push_str(&value.to_string());
    }
    buf.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::schema::FIELD_COUNT;
    use std::fs;
    use tempfile::TempDir;

    fn record(seed: f64) -> LabeledRecord {
        let mut values = [0.0; FIELD_COUNT];
        for (i, v) in values.iter_mut().enumerate() {
            *v = seed + i as f64 / 4.0;
        }
        LabeledRecord::from_values(values)
    }

    fn header_line() -> String {
        FIELD_NAMES.join(",")
    }

    #[test]
    fn test_header_written_once_across_batches() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.csv");
        let mut stream = PersistedStream::new(&path);

        stream.append(&[record(0.0), record(1.0)]).unwrap();
        stream.append(&[record(2.0)]).unwrap();
        stream.append(&[record(3.0), record(4.0), record(5.0)]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 1 + 6);
        assert_eq!(lines[0], header_line());
        assert_eq!(
            lines.iter().filter(|l| **l == header_line()).count(),
            1,
            "header must appear exactly once"
        );
        assert_eq!(stream.rows_written(), 6);
    }

    #[test]
    fn test_existing_file_is_appended_without_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.csv");

        PersistedStream::new(&path).append(&[record(0.0)]).unwrap();
        PersistedStream::new(&path).append(&[record(1.0)]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], header_line());
        assert!(lines[2].starts_with("1,"));
    }

    #[test]
    fn test_empty_batch_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.csv");
        let mut stream = PersistedStream::new(&path);

        stream.append(&[]).unwrap();

        assert!(!path.exists());
        assert_eq!(stream.rows_written(), 0);
    }

    #[test]
    fn test_row_values_in_schema_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.csv");

        PersistedStream::new(&path).append(&[record(2.0)]).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        let values: Vec<f64> = row.split(',').map(|v| v.parse().unwrap()).collect();
        assert_eq!(values.len(), FIELD_COUNT);
        assert_eq!(values[0], 2.0);
        assert_eq!(values[1], 2.25);
        assert_eq!(values[31], 2.0 + 31.0 / 4.0);
    }

    #[test]
    fn test_unwritable_destination_is_a_write_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("session.csv");
        let mut stream = PersistedStream::new(&path);

        match stream.append(&[record(0.0)]) {
            Err(StreamError::PersistenceWriteFailure { path: failed, .. }) => {
                assert_eq!(failed, path);
            }
            other => panic!("Expected PersistenceWriteFailure, got {:?}", other),
        }
    }
}
