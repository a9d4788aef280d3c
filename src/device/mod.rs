//! Acquisition board contract.
//!
//! The physical driver lives outside this crate; sources talk to it only
//! through [`DeviceBoard`]. A synthetic board ships built in so the pipeline
//! can run without hardware.

pub mod mock;
pub mod synthetic;

pub use mock::{BoardCall, BoardCallLog, MockBoard};
pub use synthetic::SyntheticBoard;

use crate::defaults::{SYNTHETIC_BOARD, SYNTHETIC_BOARD_ID};
use crate::error::{Result, StreamError};
use crate::pipeline::types::RawFrame;
use std::fmt;
use std::str::FromStr;

/// Session lifecycle and polling interface of an acquisition board.
pub trait DeviceBoard: Send {
    /// Opens a session with the given connection parameters.
    fn open_session(&mut self, params: &ConnectionParams) -> Result<()>;

    /// Starts streaming samples into the board's buffer.
    fn start_stream(&mut self) -> Result<()>;

    /// Number of samples buffered and ready to read.
    fn available_sample_count(&mut self) -> Result<usize>;

    /// Drains every buffered sample as one frame (slots × samples).
    fn read_available_samples(&mut self) -> Result<RawFrame>;

    fn stop_stream(&mut self) -> Result<()>;

    fn release_session(&mut self) -> Result<()>;

    /// Name for logging.
    fn name(&self) -> &'static str {
        "board"
    }
}

/// How to reach a board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionParams {
    pub serial_port: String,
    pub ip_port: u16,
    pub ip_protocol: u8,
    pub timeout: u32,
}

impl ConnectionParams {
    pub fn serial(port: impl Into<String>) -> Self {
        Self {
            serial_port: port.into(),
            ..Default::default()
        }
    }
}

/// Board type selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardKind {
    /// Built-in generator, no hardware required.
    Synthetic,
    /// Vendor board id handled by an external driver.
    Id(i32),
}

impl FromStr for BoardKind {
    type Err = StreamError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(SYNTHETIC_BOARD) {
            return Ok(BoardKind::Synthetic);
        }
        match s.parse::<i32>() {
            Ok(SYNTHETIC_BOARD_ID) => Ok(BoardKind::Synthetic),
            Ok(id) => Ok(BoardKind::Id(id)),
            Err(_) => Err(StreamError::ConfigInvalidValue {
                key: "source.board".to_string(),
                message: format!(
                    "expected \"{}\" or a numeric board id, got {:?}",
                    SYNTHETIC_BOARD, s
                ),
            }),
        }
    }
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardKind::Synthetic => write!(f, "{}", SYNTHETIC_BOARD),
            BoardKind::Id(id) => write!(f, "{}", id),
        }
    }
}

/// Instantiates the board for `kind`.
///
/// Only the synthetic board is linked into this crate; every other id is
/// reported as unavailable.
pub fn open_board(kind: BoardKind) -> Result<Box<dyn DeviceBoard>> {
    match kind {
        BoardKind::Synthetic => Ok(Box::new(SyntheticBoard::new())),
        BoardKind::Id(id) => Err(StreamError::SourceUnavailable {
            message: format!("no driver linked for board id {}", id),
        }),
    }
}
