//! Built-in signal generator standing in for a real board.

use crate::defaults::{CHANNEL_SLOTS, SYNTHETIC_SAMPLE_RATE};
use crate::device::{ConnectionParams, DeviceBoard};
use crate::error::{Result, StreamError};
use crate::pipeline::schema::{ACCELEROMETER, CHANNELS, SAMPLE_INDEX, TIMESTAMP};
use crate::pipeline::types::RawFrame;
use crate::source::clock::{Clock, SystemClock};
use std::f64::consts::TAU;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Peak amplitude of generated channel signals, in microvolts.
const AMPLITUDE_UV: f64 = 50.0;

/// Generates samples in real time at a fixed rate.
///
/// Channel `n` carries a sine at `n + 1` Hz, the accelerometer reports a
/// resting 1 g on its last axis, and the timestamp slot holds UNIX seconds.
pub struct SyntheticBoard {
    sample_rate: u32,
    clock: Arc<dyn Clock>,
    session_open: bool,
    stream: Option<StreamState>,
}

struct StreamState {
    started: Instant,
    epoch_secs: f64,
    emitted: u64,
}

impl SyntheticBoard {
    pub fn new() -> Self {
        Self::with_clock(SYNTHETIC_SAMPLE_RATE, Arc::new(SystemClock))
    }

    pub fn with_clock(sample_rate: u32, clock: Arc<dyn Clock>) -> Self {
        Self {
            sample_rate,
            clock,
            session_open: false,
            stream: None,
        }
    }

    fn due(&self, state: &StreamState) -> u64 {
        let elapsed = self.clock.now().duration_since(state.started).as_secs_f64();
        let total = (elapsed * self.sample_rate as f64) as u64;
        total.saturating_sub(state.emitted)
    }
}

impl Default for SyntheticBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceBoard for SyntheticBoard {
    fn open_session(&mut self, _params: &ConnectionParams) -> Result<()> {
        self.session_open = true;
        Ok(())
    }

    fn start_stream(&mut self) -> Result<()> {
        if !self.session_open {
            return Err(StreamError::Device {
                message: "start_stream called without an open session".to_string(),
            });
        }
        let epoch_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);
        self.stream = Some(StreamState {
            started: self.clock.now(),
            epoch_secs,
            emitted: 0,
        });
        Ok(())
    }

    fn available_sample_count(&mut self) -> Result<usize> {
        Ok(self
            .stream
            .as_ref()
            .map_or(0, |state| self.due(state) as usize))
    }

    fn read_available_samples(&mut self) -> Result<RawFrame> {
        let Some(state) = self.stream.as_ref() else {
            return Err(StreamError::Device {
                message: "read called while not streaming".to_string(),
            });
        };
        let count = self.due(state) as usize;
        let first = state.emitted;
        let epoch_secs = state.epoch_secs;
        let rate = self.sample_rate as f64;

        let mut rows = vec![vec![0.0; count]; CHANNEL_SLOTS];
        for col in 0..count {
            let index = first + col as u64;
            let t = index as f64 / rate;
            rows[SAMPLE_INDEX][col] = index as f64;
            for (n, slot) in CHANNELS.enumerate() {
                rows[slot][col] = AMPLITUDE_UV * (TAU * (n + 1) as f64 * t).sin();
            }
            rows[ACCELEROMETER.end - 1][col] = 1.0;
            rows[TIMESTAMP][col] = epoch_secs + t;
        }

        if let Some(state) = self.stream.as_mut() {
            state.emitted += count as u64;
        }
        RawFrame::from_rows(rows)
    }

    fn stop_stream(&mut self) -> Result<()> {
        self.stream = None;
        Ok(())
    }

    fn release_session(&mut self) -> Result<()> {
        self.stream = None;
        self.session_open = false;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "synthetic"
    }
}
