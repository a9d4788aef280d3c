//! Scripted board for tests.

use crate::device::{ConnectionParams, DeviceBoard};
use crate::error::{Result, StreamError};
use crate::pipeline::types::RawFrame;
use crate::source::clock::MockClock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Lifecycle call observed by a [`MockBoard`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCall {
    OpenSession,
    StartStream,
    Poll,
    Read,
    StopStream,
    ReleaseSession,
}

/// Shared view of the calls a [`MockBoard`] received, usable after the
/// board has been moved into a source.
#[derive(Debug, Clone, Default)]
pub struct BoardCallLog {
    calls: Arc<Mutex<Vec<BoardCall>>>,
}

impl BoardCallLog {
    fn push(&self, call: BoardCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    pub fn calls(&self) -> Vec<BoardCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn count(&self, call: BoardCall) -> usize {
        self.calls().iter().filter(|c| **c == call).count()
    }
}

/// Mock board returning scripted frames.
#[derive(Debug, Clone, Default)]
pub struct MockBoard {
    frames: VecDeque<RawFrame>,
    repeating: Option<RawFrame>,
    should_fail_open: bool,
    should_fail_read: bool,
    tick: Option<(MockClock, Duration)>,
    log: BoardCallLog,
}

impl MockBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames handed out one per non-empty poll, in order.
    pub fn with_frames(mut self, frames: Vec<RawFrame>) -> Self {
        self.frames = frames.into();
        self
    }

    /// Frame returned by every poll once the scripted frames run out.
    pub fn with_repeating_frame(mut self, frame: RawFrame) -> Self {
        self.repeating = Some(frame);
        self
    }

    /// Configure the mock to fail on open_session.
    pub fn with_open_failure(mut self) -> Self {
        self.should_fail_open = true;
        self
    }

    /// Configure the mock to fail on read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Advance `clock` by `tick` on every poll.
    pub fn with_tick(mut self, clock: MockClock, tick: Duration) -> Self {
        self.tick = Some((clock, tick));
        self
    }

    pub fn call_log(&self) -> BoardCallLog {
        self.log.clone()
    }

    fn next_frame(&self) -> Option<&RawFrame> {
        self.frames.front().or(self.repeating.as_ref())
    }
}

impl DeviceBoard for MockBoard {
    fn open_session(&mut self, params: &ConnectionParams) -> Result<()> {
        self.log.push(BoardCall::OpenSession);
        if self.should_fail_open {
            return Err(StreamError::SourceUnavailable {
                message: format!("mock board refused {:?}", params.serial_port),
            });
        }
        Ok(())
    }

    fn start_stream(&mut self) -> Result<()> {
        self.log.push(BoardCall::StartStream);
        Ok(())
    }

    fn available_sample_count(&mut self) -> Result<usize> {
        self.log.push(BoardCall::Poll);
        if let Some((clock, tick)) = &self.tick {
            clock.advance(*tick);
        }
        Ok(self.next_frame().map_or(0, RawFrame::cols))
    }

    fn read_available_samples(&mut self) -> Result<RawFrame> {
        self.log.push(BoardCall::Read);
        if self.should_fail_read {
            return Err(StreamError::Device {
                message: "mock read failure".to_string(),
            });
        }
        if let Some(frame) = self.frames.pop_front() {
            return Ok(frame);
        }
        self.repeating.clone().ok_or_else(|| StreamError::Device {
            message: "mock board has no frames".to_string(),
        })
    }

    fn stop_stream(&mut self) -> Result<()> {
        self.log.push(BoardCall::StopStream);
        Ok(())
    }

    fn release_session(&mut self) -> Result<()> {
        self.log.push(BoardCall::ReleaseSession);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_frames_then_empty() {
        let mut board = MockBoard::new().with_frames(vec![
            RawFrame::from_column(vec![1.0; 32]),
            RawFrame::from_rows(vec![vec![0.0, 0.0]; 32]).unwrap(),
        ]);

        assert_eq!(board.available_sample_count().unwrap(), 1);
        assert_eq!(board.read_available_samples().unwrap().cols(), 1);
        assert_eq!(board.available_sample_count().unwrap(), 2);
        assert_eq!(board.read_available_samples().unwrap().cols(), 2);
        assert_eq!(board.available_sample_count().unwrap(), 0);
        assert!(board.read_available_samples().is_err());
    }

    #[test]
    fn test_repeating_frame() {
        let mut board = MockBoard::new().with_repeating_frame(RawFrame::from_column(vec![0.0; 32]));
        for _ in 0..3 {
            assert_eq!(board.available_sample_count().unwrap(), 1);
            assert!(board.read_available_samples().is_ok());
        }
    }

    #[test]
    fn test_tick_advances_clock_per_poll() {
        let clock = MockClock::new();
        let start = crate::source::clock::Clock::now(&clock);
        let mut board = MockBoard::new().with_tick(clock.clone(), Duration::from_millis(4));

        board.available_sample_count().unwrap();
        board.available_sample_count().unwrap();

        let elapsed = crate::source::clock::Clock::now(&clock) - start;
        assert_eq!(elapsed, Duration::from_millis(8));
    }

    #[test]
    fn test_call_log_shared_after_move() {
        let board = MockBoard::new().with_open_failure();
        let log = board.call_log();
        let mut moved: Box<dyn DeviceBoard> = Box::new(board);

        assert!(moved.open_session(&ConnectionParams::default()).is_err());
        moved.release_session().unwrap();

        assert_eq!(
            log.calls(),
            vec![BoardCall::OpenSession, BoardCall::ReleaseSession]
        );
        assert_eq!(log.count(BoardCall::Poll), 0);
    }

    #[test]
    fn test_read_failure() {
        let mut board = MockBoard::new()
            .with_repeating_frame(RawFrame::from_column(vec![0.0; 32]))
            .with_read_failure();
        assert!(matches!(
            board.read_available_samples(),
            Err(StreamError::Device { .. })
        ));
    }
}
