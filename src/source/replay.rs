//! Replay of a recorded stream at its original pace.

use crate::error::{Result, StreamError};
use crate::pipeline::queue::FrameProducer;
use crate::pipeline::schema::{FIELD_COUNT, FIELD_NAMES, SAMPLE_INDEX, slot_of};
use crate::pipeline::types::{ProductionSummary, RawFrame};
use crate::source::FrameSource;
use crate::source::clock::{Clock, SystemClock};
use crate::storage::RecordedStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Pushes one single-sample frame per recorded row, sleeping the recorded
/// timestamp delta before each push after the first.
pub struct ReplaySource {
    path: Option<PathBuf>,
    stream: Option<RecordedStream>,
    clock: Arc<dyn Clock>,
}

impl ReplaySource {
    /// Replays the file at `path`. The file is read on `open`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            stream: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replays an already loaded stream.
    pub fn from_recorded(stream: RecordedStream) -> Self {
        Self {
            path: None,
            stream: Some(stream),
            clock: Arc::new(SystemClock),
        }
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// Inter-sample delays reconstructed from timestamps.
///
/// The first delay is zero. Negative or non-finite deltas (clock steps in the
/// recording) are clamped to zero.
pub fn replay_delays(timestamps: &[f64]) -> Vec<Duration> {
    let mut delays = Vec::with_capacity(timestamps.len());
    let mut previous: Option<f64> = None;
    for &ts in timestamps {
        let delta = previous.map_or(0.0, |p| ts - p);
        delays.push(Duration::try_from_secs_f64(delta).unwrap_or(Duration::ZERO));
        previous = Some(ts);
    }
    delays
}

/// Where each channel slot takes its value from in a recorded row.
struct SlotMapping {
    sources: [Option<usize>; FIELD_COUNT],
}

impl SlotMapping {
    /// Binds columns to slots by header name.
    ///
    /// Unknown and duplicate columns are rejected so no recorded value is lost.
    fn for_stream(stream: &RecordedStream) -> Result<Self> {
        let mut sources = [None; FIELD_COUNT];
        for (column, name) in stream.columns().iter().enumerate() {
            let slot = slot_of(name).ok_or_else(|| StreamError::ReplayFormat {
                line: 1,
                message: format!("unknown column {:?}", name),
            })?;
            if let Some(previous) = sources[slot].replace(column) {
                return Err(StreamError::ReplayFormat {
                    line: 1,
                    message: format!(
                        "columns {:?} and {:?} both bind to field {}",
                        stream.columns()[previous],
                        name,
                        FIELD_NAMES[slot]
                    ),
                });
            }
        }
        Ok(Self { sources })
    }

    /// Missing sample index falls back to the row number, other missing slots to zero.
    fn frame(&self, row_index: usize, row: &[f64]) -> RawFrame {
        let values = self
            .sources
            .iter()
            .enumerate()
            .map(|(slot, source)| match source {
                Some(column) => row[*column],
                None if slot == SAMPLE_INDEX => row_index as f64,
                None => 0.0,
            })
            .collect();
        RawFrame::from_column(values)
    }
}

impl FrameSource for ReplaySource {
    fn open(&mut self) -> Result<()> {
        if self.stream.is_none() {
            let path = self.path.as_deref().ok_or_else(|| StreamError::SourceUnavailable {
                message: "replay source has neither a path nor a loaded stream".to_string(),
            })?;
            self.stream = Some(RecordedStream::read(path)?);
        }
        if let Some(stream) = self.stream.as_ref() {
            stream.timestamps()?;
            SlotMapping::for_stream(stream)?;
            log::info!("replay: loaded {} rows", stream.len());
        }
        Ok(())
    }

    fn produce(&mut self, out: &FrameProducer) -> Result<ProductionSummary> {
        let stream = self.stream.take().ok_or_else(|| StreamError::SourceUnavailable {
            message: "replay source produced before open".to_string(),
        })?;
        let delays = replay_delays(&stream.timestamps()?);
        let mapping = SlotMapping::for_stream(&stream)?;
        let mut summary = ProductionSummary::default();

        for (index, (row, delay)) in stream.rows().iter().zip(delays).enumerate() {
            if index > 0 {
                self.clock.sleep(delay);
            }
            let frame = mapping.frame(index, row);
            summary.record(&frame);
            out.push(frame)?;
        }

        log::info!("replay: simulate done, {} frames", summary.frames);
        Ok(summary)
    }

    fn name(&self) -> &'static str {
        "replay"
    }
}
