//! Live capture from an acquisition board.

use crate::device::{ConnectionParams, DeviceBoard};
use crate::error::{Result, StreamError};
use crate::pipeline::queue::FrameProducer;
use crate::pipeline::types::ProductionSummary;
use crate::source::FrameSource;
use crate::source::clock::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// What the capture loop does when the board has nothing buffered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStrategy {
    /// Poll again immediately. Lowest latency, one core busy.
    Spin,
    /// Sleep before polling again.
    Backoff(Duration),
}

impl PollStrategy {
    /// 0 selects [`PollStrategy::Spin`].
    pub fn from_backoff_ms(ms: u64) -> Self {
        if ms == 0 {
            PollStrategy::Spin
        } else {
            PollStrategy::Backoff(Duration::from_millis(ms))
        }
    }
}

/// Polls a board for a fixed duration, pushing every non-empty read as one frame.
pub struct LiveSource {
    board: Box<dyn DeviceBoard>,
    params: ConnectionParams,
    duration: Duration,
    poll: PollStrategy,
    clock: Arc<dyn Clock>,
    streaming: bool,
}

impl LiveSource {
    pub fn new(board: Box<dyn DeviceBoard>, params: ConnectionParams, duration: Duration) -> Self {
        Self {
            board,
            params,
            duration,
            poll: PollStrategy::Spin,
            clock: Arc::new(SystemClock),
            streaming: false,
        }
    }

    pub fn with_poll_strategy(mut self, poll: PollStrategy) -> Self {
        self.poll = poll;
        self
    }

    /// Sets a custom clock (for deterministic testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Polls until the duration has elapsed.
    ///
    /// Elapsed time is checked once per poll, after any read, so a polled
    /// frame is always pushed and the run overshoots by at most one poll.
    fn capture(&mut self, out: &FrameProducer) -> Result<ProductionSummary> {
        let start = self.clock.now();
        let mut summary = ProductionSummary::default();

        loop {
            let available = self.board.available_sample_count()?;
            if available > 0 {
                let frame = self.board.read_available_samples()?;
                if !frame.is_empty() {
                    summary.record(&frame);
                    out.push(frame)?;
                }
            }

            if self.clock.now().duration_since(start) >= self.duration {
                break;
            }

            if available == 0 {
                match self.poll {
                    PollStrategy::Spin => std::hint::spin_loop(),
                    PollStrategy::Backoff(wait) => self.clock.sleep(wait),
                }
            }
        }

        Ok(summary)
    }

    fn shutdown(&mut self) -> Result<()> {
        self.streaming = false;
        let stopped = self.board.stop_stream();
        let released = self.board.release_session();
        stopped.and(released)
    }
}

fn unavailable(error: StreamError) -> StreamError {
    match error {
        StreamError::SourceUnavailable { .. } => error,
        other => StreamError::SourceUnavailable {
            message: other.to_string(),
        },
    }
}

impl FrameSource for LiveSource {
    fn open(&mut self) -> Result<()> {
        self.board.open_session(&self.params).map_err(unavailable)?;
        if let Err(e) = self.board.start_stream() {
            if let Err(release) = self.board.release_session() {
                log::warn!("{}: release after failed start: {}", self.board.name(), release);
            }
            return Err(unavailable(e));
        }
        self.streaming = true;
        log::info!(
            "{}: streaming from {:?}",
            self.board.name(),
            self.params.serial_port
        );
        Ok(())
    }

    fn produce(&mut self, out: &FrameProducer) -> Result<ProductionSummary> {
        if !self.streaming {
            return Err(StreamError::SourceUnavailable {
                message: "live source produced before open".to_string(),
            });
        }

        // Stop and release run whether or not capture succeeded.
        let captured = self.capture(out);
        let shut_down = self.shutdown();
        let summary = captured?;
        shut_down?;

        log::info!(
            "{}: gather done, {} frames / {} samples",
            self.board.name(),
            summary.frames,
            summary.samples
        );
        Ok(summary)
    }

    fn name(&self) -> &'static str {
        "live"
    }
}

impl Drop for LiveSource {
    /// A source opened but never run (e.g. the pipeline failed to spawn its
    /// workers) still stops and releases the board.
    fn drop(&mut self) {
        if self.streaming
            && let Err(e) = self.shutdown()
        {
            log::warn!("{}: release on drop: {}", self.board.name(), e);
        }
    }
}
