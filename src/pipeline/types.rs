//! Data types for the acquisition pipeline.

use crate::error::{Result, StreamError};
use crate::pipeline::schema::{
    ACCELEROMETER, ANALOG, AUXILIARY, CHANNELS, FIELD_COUNT, FIELD_NAMES, PRIMARY_CHANNELS,
    SAMPLE_INDEX, TIMESTAMP, TRAILING_AUXILIARY,
};
use std::fmt;
use std::time::Duration;

/// One poll's worth of raw samples.
///
/// Rows are channel slots, columns are samples. Stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl RawFrame {
    /// Builds a frame from per-slot rows. Every row must hold the same
    /// number of samples.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let row_count = rows.len();
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(row_count * cols);
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(StreamError::Device {
                    message: format!(
                        "ragged frame: row {} has {} samples, expected {}",
                        index,
                        row.len(),
                        cols
                    ),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: row_count,
            cols,
            data,
        })
    }

    /// Builds a single-sample frame, one value per slot.
    pub fn from_column(values: Vec<f64>) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values,
        }
    }

    /// Number of channel slots.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of samples.
    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.cols == 0
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Samples of one channel slot.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Values of every slot for one sample.
    pub fn column(&self, col: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.rows).map(move |row| self.data[row * self.cols + col])
    }
}

/// One sample bound to the fixed field schema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabeledRecord {
    values: [f64; FIELD_COUNT],
}

impl LabeledRecord {
    pub fn from_values(values: [f64; FIELD_COUNT]) -> Self {
        Self { values }
    }

    /// All field values in schema order.
    pub fn values(&self) -> &[f64; FIELD_COUNT] {
        &self.values
    }

    /// `(name, value)` pairs in schema order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FIELD_NAMES.iter().copied().zip(self.values.iter().copied())
    }

    pub fn sample_index(&self) -> f64 {
        self.values[SAMPLE_INDEX]
    }

    pub fn channels(&self) -> &[f64] {
        &self.values[CHANNELS]
    }

    pub fn accelerometer(&self) -> &[f64] {
        &self.values[ACCELEROMETER]
    }

    pub fn auxiliary(&self) -> &[f64] {
        &self.values[AUXILIARY]
    }

    pub fn analog(&self) -> &[f64] {
        &self.values[ANALOG]
    }

    pub fn timestamp(&self) -> f64 {
        self.values[TIMESTAMP]
    }

    pub fn trailing_auxiliary(&self) -> f64 {
        self.values[TRAILING_AUXILIARY]
    }

    /// Projects this record onto the live view fields.
    pub fn reduced(&self) -> ReducedView {
        let mut channels = [0.0; PRIMARY_CHANNELS];
        channels.copy_from_slice(self.channels());
        ReducedView {
            sample_index: self.sample_index(),
            channels,
            timestamp: self.timestamp(),
        }
    }
}

/// Sample index, primary channels and timestamp of one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReducedView {
    pub sample_index: f64,
    pub channels: [f64; PRIMARY_CHANNELS],
    pub timestamp: f64,
}

impl fmt::Display for ReducedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sample_index)?;
        for value in &self.channels {
            write!(f, ",{}", value)?;
        }
        write!(f, ",{}", self.timestamp)
    }
}

/// What a source pushed before it finished.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductionSummary {
    pub frames: u64,
    pub samples: u64,
}

impl ProductionSummary {
    pub(crate) fn record(&mut self, frame: &RawFrame) {
        self.frames += 1;
        self.samples += frame.cols() as u64;
    }
}

/// What the sink consumed before the stream closed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumptionSummary {
    pub frames: u64,
    pub records: u64,
    /// Reduced batches dropped because the live view consumer was behind.
    pub views_dropped: u64,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub production: ProductionSummary,
    pub consumption: ConsumptionSummary,
    pub elapsed: Duration,
}
