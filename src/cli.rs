//! Command-line interface for thoughtstream
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Stream EEG board frames into labeled recordings
#[derive(Parser, Debug)]
#[command(
    name = "thoughtstream",
    version,
    about = "Stream EEG board frames into labeled recordings"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only report errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a capture duration: a bare number is seconds, otherwise humantime ("1m30s").
fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f64>() {
        return Duration::try_from_secs_f64(secs).map_err(|e| e.to_string());
    }
    humantime::parse_duration(s).map_err(|e| e.to_string())
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Capture from a live board for a fixed duration
    Capture {
        /// Board: "synthetic" or a numeric board id
        #[arg(long, value_name = "BOARD")]
        board: Option<String>,

        /// Serial port of the board (e.g., /dev/ttyUSB0)
        #[arg(long, value_name = "PORT")]
        serial_port: Option<String>,

        /// Capture duration (e.g., 30, 30s, 5m)
        #[arg(long, short = 'd', value_name = "DURATION", value_parser = parse_duration)]
        duration: Option<Duration>,

        /// Append labeled records to this file
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the reduced view to stdout as it arrives
        #[arg(long)]
        show: bool,
    },

    /// Replay a recorded stream at its original pace
    Replay {
        /// Recorded stream to replay
        path: PathBuf,

        /// Append labeled records to this file
        #[arg(long, short = 'o', value_name = "PATH")]
        output: Option<PathBuf>,

        /// Print the reduced view to stdout as it arrives
        #[arg(long)]
        show: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration (file + environment)
    Show,
    /// Dump a commented configuration template
    Dump,
}
