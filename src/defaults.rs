//! Default configuration constants for thoughtstream.
//!
//! Shared by the config file, the CLI and the pipeline so every entry point
//! starts from the same values.

use std::time::Duration;

/// Number of channel slots in every raw frame.
///
/// One row per slot; a frame with any other row count is rejected by the
/// transcoder.
pub const CHANNEL_SLOTS: usize = 32;

/// Default capture duration for live mode, in seconds.
pub const CAPTURE_SECS: u64 = 10;

/// Default backoff when the board reports no available samples, in milliseconds.
///
/// 0 selects a pure spin loop.
pub const POLL_BACKOFF_MS: u64 = 1;

/// Interval at which the run supervisor checks whether both workers are alive.
pub const LIVENESS_INTERVAL_MS: u64 = 1000;

/// Transfer queue capacity. 0 means unbounded.
pub const QUEUE_CAPACITY: usize = 0;

/// Number of reduced-view batches buffered for the live consumer before
/// further batches are dropped.
pub const VIEW_BUFFER: usize = 64;

/// Sample rate of the built-in synthetic board, in Hz.
pub const SYNTHETIC_SAMPLE_RATE: u32 = 250;

/// Board identifier accepted for the built-in synthetic board.
pub const SYNTHETIC_BOARD: &str = "synthetic";

/// Numeric board id reserved for the synthetic board.
pub const SYNTHETIC_BOARD_ID: i32 = -1;

/// Liveness interval as a [`Duration`].
pub fn liveness_interval() -> Duration {
    Duration::from_millis(LIVENESS_INTERVAL_MS)
}
