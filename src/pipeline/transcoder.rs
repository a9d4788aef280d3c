//! Raw frame to labeled record conversion.

use crate::defaults::CHANNEL_SLOTS;
use crate::error::{Result, StreamError};
use crate::pipeline::schema::FIELD_COUNT;
use crate::pipeline::types::{LabeledRecord, RawFrame, ReducedView};

/// Transposes a frame into one record per sample, binding slots to fields
/// positionally.
///
/// A frame with anything other than [`CHANNEL_SLOTS`] rows comes from a
/// corrupted or incompatible source and is rejected.
pub fn extract(frame: &RawFrame) -> Result<Vec<LabeledRecord>> {
    if frame.rows() != CHANNEL_SLOTS {
        return Err(StreamError::SchemaMismatch {
            expected: CHANNEL_SLOTS,
            actual: frame.rows(),
        });
    }

    let records = (0..frame.cols())
        .map(|col| {
            let mut values = [0.0; FIELD_COUNT];
            for (slot, value) in values.iter_mut().zip(frame.column(col)) {
                *slot = value;
            }
            LabeledRecord::from_values(values)
        })
        .collect();

    Ok(records)
}

/// Projects a batch onto the live view fields.
pub fn reduce(records: &[LabeledRecord]) -> Vec<ReducedView> {
    records.iter().map(LabeledRecord::reduced).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::schema::{FIELD_NAMES, TIMESTAMP};

    /// Frame where slot `r` of sample `c` holds `r * 100 + c`.
    fn indexed_frame(rows: usize, cols: usize) -> RawFrame {
        RawFrame::from_rows(
            (0..rows)
                .map(|r| (0..cols).map(|c| (r * 100 + c) as f64).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_extract_one_record_per_column() {
        for cols in [1, 2, 7, 250] {
            let records = extract(&indexed_frame(CHANNEL_SLOTS, cols)).unwrap();
            assert_eq!(records.len(), cols);
            for record in &records {
                assert_eq!(record.fields().count(), FIELD_NAMES.len());
            }
        }
    }

    #[test]
    fn test_extract_transposes_positionally() {
        let records = extract(&indexed_frame(CHANNEL_SLOTS, 3)).unwrap();

        for (col, record) in records.iter().enumerate() {
            for (slot, value) in record.values().iter().enumerate() {
                assert_eq!(*value, (slot * 100 + col) as f64);
            }
        }
        assert_eq!(records[2].timestamp(), (TIMESTAMP * 100 + 2) as f64);
    }

    #[test]
    fn test_extract_preserves_sample_order() {
        let records = extract(&indexed_frame(CHANNEL_SLOTS, 5)).unwrap();
        let indices: Vec<f64> = records.iter().map(LabeledRecord::sample_index).collect();
        assert_eq!(indices, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_extract_empty_frame_yields_no_records() {
        let frame = RawFrame::from_rows(vec![Vec::new(); CHANNEL_SLOTS]).unwrap();
        assert!(extract(&frame).unwrap().is_empty());
    }

    #[test]
    fn test_extract_rejects_wrong_row_count() {
        for rows in [0, 1, 24, 31, 33] {
            match extract(&indexed_frame(rows, 2)) {
                Err(StreamError::SchemaMismatch { expected, actual }) => {
                    assert_eq!(expected, CHANNEL_SLOTS);
                    assert_eq!(actual, rows);
                }
                other => panic!("Expected SchemaMismatch for {rows} rows, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_reduce_projects_every_record() {
        let records = extract(&indexed_frame(CHANNEL_SLOTS, 4)).unwrap();
        let views = reduce(&records);

        assert_eq!(views.len(), 4);
        assert_eq!(views[3].sample_index, 3.0);
        assert_eq!(views[3].channels[0], 103.0);
        assert_eq!(views[3].timestamp, (TIMESTAMP * 100 + 3) as f64);
    }
}
