//! Frame sources: live board capture and recorded-stream replay.

pub mod clock;
pub mod live;
pub mod replay;

pub use clock::{Clock, MockClock, SystemClock};
pub use live::{LiveSource, PollStrategy};
pub use replay::{ReplaySource, replay_delays};

use crate::error::Result;
use crate::pipeline::queue::FrameProducer;
use crate::pipeline::types::ProductionSummary;

/// Producer side of the pipeline.
///
/// `open` runs on the caller's thread before any worker starts, so a source
/// that cannot be reached aborts the run up front. `produce` runs on the
/// producer worker and pushes frames until the input is exhausted; the
/// pipeline releases the completion signal after it returns successfully.
pub trait FrameSource: Send {
    /// Prepares the source. Failure here is [`crate::StreamError::SourceUnavailable`].
    fn open(&mut self) -> Result<()>;

    /// Pushes every frame, in order.
    fn produce(&mut self, out: &FrameProducer) -> Result<ProductionSummary>;

    /// Name for logging and error reporting.
    fn name(&self) -> &'static str;
}
