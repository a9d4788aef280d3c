//! Reader for previously persisted record files.

use crate::error::{Result, StreamError};
use crate::pipeline::schema::TIMESTAMP_FIELD;
use crate::storage::DELIMITER;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A recorded stream loaded fully into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedStream {
    columns: Vec<String>,
    rows: Vec<Vec<f64>>,
}

impl RecordedStream {
    /// Loads a recorded stream from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => StreamError::SourceUnavailable {
                message: format!("recorded stream not found: {}", path.display()),
            },
            _ => StreamError::Io(e),
        })?;
        Self::parse(BufReader::new(file))
    }

    /// Parses a header row followed by numeric rows. Blank lines are skipped.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        let mut columns: Option<Vec<String>> = None;
        let mut rows = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let Some(header) = columns.as_ref() else {
                columns = Some(line.split(DELIMITER).map(|c| c.trim().to_string()).collect());
                continue;
            };

            let row = line
                .split(DELIMITER)
                .map(|field| {
                    field
                        .trim()
                        .parse::<f64>()
                        .map_err(|e| StreamError::ReplayFormat {
                            line: line_no,
                            message: format!("invalid value {:?}: {}", field.trim(), e),
                        })
                })
                .collect::<Result<Vec<f64>>>()?;

            if row.len() != header.len() {
                return Err(StreamError::ReplayFormat {
                    line: line_no,
                    message: format!("expected {} values, got {}", header.len(), row.len()),
                });
            }
            rows.push(row);
        }

        let columns = columns.ok_or_else(|| StreamError::ReplayFormat {
            line: 1,
            message: "missing header row".to_string(),
        })?;

        Ok(Self { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of the `Ts` column.
    pub fn timestamps(&self) -> Result<Vec<f64>> {
        let ts = self
            .column_index(TIMESTAMP_FIELD)
            .ok_or_else(|| StreamError::ReplayFormat {
                line: 1,
                message: format!("missing required column {:?}", TIMESTAMP_FIELD),
            })?;
        Ok(self.rows.iter().map(|row| row[ts]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn parse(text: &str) -> Result<RecordedStream> {
        RecordedStream::parse(Cursor::new(text.as_bytes().to_vec()))
    }

    #[test]
    fn test_parse_header_and_rows() {
        let stream = parse("Ts,C0,C1\n0.0,1,4\n0.5,2,5\n1.2,3,6\n").unwrap();

        assert_eq!(stream.columns(), &["Ts", "C0", "C1"]);
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.rows()[1], vec![0.5, 2.0, 5.0]);
        assert_eq!(stream.column_index("C1"), Some(2));
        assert_eq!(stream.timestamps().unwrap(), vec![0.0, 0.5, 1.2]);
    }

    #[test]
    fn test_parse_skips_blank_lines_and_trims() {
        let stream = parse("\n Ts , C0 \n\n 1 , 2 \n").unwrap();
        assert_eq!(stream.columns(), &["Ts", "C0"]);
        assert_eq!(stream.rows(), &[vec![1.0, 2.0]]);
    }

    #[test]
    fn test_parse_header_only_is_empty() {
        let stream = parse("Ts,C0\n").unwrap();
        assert!(stream.is_empty());
    }

    #[test]
    fn test_parse_empty_input_is_missing_header() {
        match parse("") {
            Err(StreamError::ReplayFormat { line, message }) => {
                assert_eq!(line, 1);
                assert!(message.contains("header"));
            }
            other => panic!("Expected ReplayFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_short_row() {
        match parse("Ts,C0\n0,1\n0.5\n") {
            Err(StreamError::ReplayFormat { line, message }) => {
                assert_eq!(line, 3);
                assert!(message.contains("expected 2 values, got 1"), "{message}");
            }
            other => panic!("Expected ReplayFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric_value() {
        match parse("Ts,C0\n0,abc\n") {
            Err(StreamError::ReplayFormat { line, message }) => {
                assert_eq!(line, 2);
                assert!(message.contains("abc"), "{message}");
            }
            other => panic!("Expected ReplayFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_timestamp_column() {
        let stream = parse("C0,C1\n1,2\n").unwrap();
        assert!(matches!(
            stream.timestamps(),
            Err(StreamError::ReplayFormat { .. })
        ));
    }

    #[test]
    fn test_read_missing_file_is_source_unavailable() {
        let result = RecordedStream::read(Path::new("/nonexistent/thoughtstream/session.csv"));
        assert!(matches!(
            result,
            Err(StreamError::SourceUnavailable { .. })
        ));
    }
}
