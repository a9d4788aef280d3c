use crate::defaults;
use crate::device::{BoardKind, ConnectionParams};
use crate::error::{Result, StreamError};
use crate::pipeline::orchestrator::PipelineConfig;
use crate::source::PollStrategy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub capture: CaptureConfig,
    pub pipeline: PipelineSection,
    pub output: OutputConfig,
}

/// Board selection and connection parameters
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SourceConfig {
    /// "synthetic" or a numeric board id
    pub board: String,
    pub serial_port: String,
    pub ip_port: u16,
    pub ip_protocol: u8,
    pub timeout: u32,
}

/// Live capture configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    pub duration_secs: f64,
    /// Sleep when the board has nothing buffered. 0 = spin.
    pub poll_backoff_ms: u64,
}

/// Transfer queue and supervision configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineSection {
    /// 0 = unbounded
    pub queue_capacity: usize,
    pub liveness_interval_ms: u64,
    pub view_buffer: usize,
}

/// Persisted stream configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            board: defaults::SYNTHETIC_BOARD.to_string(),
            serial_port: String::new(),
            ip_port: 0,
            ip_protocol: 0,
            timeout: 0,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            duration_secs: defaults::CAPTURE_SECS as f64,
            poll_backoff_ms: defaults::POLL_BACKOFF_MS,
        }
    }
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            queue_capacity: defaults::QUEUE_CAPACITY,
            liveness_interval_ms: defaults::LIVENESS_INTERVAL_MS,
            view_buffer: defaults::VIEW_BUFFER,
        }
    }
}

/// Commented template printed by `thoughtstream config dump`.
pub const TEMPLATE: &str = r#"# thoughtstream configuration

[source]
# "synthetic" for the built-in generator, or a numeric board id
board = "synthetic"
serial_port = ""
ip_port = 0
ip_protocol = 0
timeout = 0

[capture]
# How long a live capture runs
duration_secs = 10.0
# Sleep when the board has no samples buffered (0 = spin)
poll_backoff_ms = 1

[pipeline]
# Transfer queue capacity (0 = unbounded)
queue_capacity = 0
liveness_interval_ms = 1000
# Reduced-view batches buffered for --show before dropping
view_buffer = 64

[output]
# Append labeled records here (omit to only stream)
# destination = "session.csv"
"#;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| StreamError::ConfigParse {
            message: format!("{}: {}", path.display(), e),
        })?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only a missing file yields defaults; invalid TOML is an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e)
                if e.downcast_ref::<std::io::Error>()
                    .is_some_and(|io_err| io_err.kind() == std::io::ErrorKind::NotFound) =>
            {
                log::debug!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.context(format!("Failed to load config from {}", path.display()))),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - THOUGHTSTREAM_BOARD → source.board
    /// - THOUGHTSTREAM_SERIAL_PORT → source.serial_port
    /// - THOUGHTSTREAM_DESTINATION → output.destination
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(board) = std::env::var("THOUGHTSTREAM_BOARD")
            && !board.is_empty()
        {
            self.source.board = board;
        }

        if let Ok(port) = std::env::var("THOUGHTSTREAM_SERIAL_PORT")
            && !port.is_empty()
        {
            self.source.serial_port = port;
        }

        if let Ok(destination) = std::env::var("THOUGHTSTREAM_DESTINATION")
            && !destination.is_empty()
        {
            self.output.destination = Some(PathBuf::from(destination));
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/thoughtstream/config.toml on Linux
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("thoughtstream").join("config.toml"))
            .ok_or_else(|| StreamError::ConfigInvalidValue {
                key: "config_dir".to_string(),
                message: "could not determine the user configuration directory".to_string(),
            })
    }

    pub fn board_kind(&self) -> Result<BoardKind> {
        self.source.board.parse()
    }

    pub fn connection_params(&self) -> ConnectionParams {
        ConnectionParams {
            serial_port: self.source.serial_port.clone(),
            ip_port: self.source.ip_port,
            ip_protocol: self.source.ip_protocol,
            timeout: self.source.timeout,
        }
    }

    pub fn capture_duration(&self) -> Result<Duration> {
        Duration::try_from_secs_f64(self.capture.duration_secs).map_err(|_| {
            StreamError::ConfigInvalidValue {
                key: "capture.duration_secs".to_string(),
                message: format!(
                    "expected a non-negative number of seconds, got {}",
                    self.capture.duration_secs
                ),
            }
        })
    }

    pub fn poll_strategy(&self) -> PollStrategy {
        PollStrategy::from_backoff_ms(self.capture.poll_backoff_ms)
    }

    /// Checks every value that can be out of range after deserialization.
    pub fn validate(&self) -> Result<()> {
        self.board_kind()?;
        self.capture_duration()?;
        if self.pipeline.liveness_interval_ms == 0 {
            return Err(StreamError::ConfigInvalidValue {
                key: "pipeline.liveness_interval_ms".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        if self.pipeline.view_buffer == 0 {
            return Err(StreamError::ConfigInvalidValue {
                key: "pipeline.view_buffer".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }
        Ok(())
    }

    /// Pipeline settings without a view channel; callers attach one for `--show`.
    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            queue_capacity: match self.pipeline.queue_capacity {
                0 => None,
                n => Some(n),
            },
            liveness_interval: Duration::from_millis(self.pipeline.liveness_interval_ms),
            view_tx: None,
        }
    }

    /// Serializes the effective configuration.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    // SAFETY: These helpers are only used in tests with ENV_LOCK held,
    // ensuring no concurrent access to environment variables.
    fn set_env(key: &str, value: &str) {
        unsafe { std::env::set_var(key, value) }
    }

    fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) }
    }

    fn clear_thoughtstream_env() {
        remove_env("THOUGHTSTREAM_BOARD");
        remove_env("THOUGHTSTREAM_SERIAL_PORT");
        remove_env("THOUGHTSTREAM_DESTINATION");
    }

    fn write_config(contents: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(contents.as_bytes()).unwrap();
        temp_file
    }

    #[test]
    fn test_default_config_has_correct_values() {
        let config = Config::default();

        assert_eq!(config.source.board, "synthetic");
        assert_eq!(config.source.serial_port, "");
        assert_eq!(config.capture.duration_secs, 10.0);
        assert_eq!(config.capture.poll_backoff_ms, 1);
        assert_eq!(config.pipeline.queue_capacity, 0);
        assert_eq!(config.pipeline.liveness_interval_ms, 1000);
        assert_eq!(config.pipeline.view_buffer, 64);
        assert_eq!(config.output.destination, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp_file = write_config(
            r#"
            [source]
            board = "2"
            serial_port = "/dev/ttyUSB0"
            timeout = 15

            [capture]
            duration_secs = 2.5
            poll_backoff_ms = 0

            [pipeline]
            queue_capacity = 128
            liveness_interval_ms = 250

            [output]
            destination = "/tmp/session.csv"
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.board_kind().unwrap(), BoardKind::Id(2));
        assert_eq!(config.connection_params().serial_port, "/dev/ttyUSB0");
        assert_eq!(config.connection_params().timeout, 15);
        assert_eq!(config.capture_duration().unwrap(), Duration::from_millis(2500));
        assert_eq!(config.poll_strategy(), PollStrategy::Spin);
        assert_eq!(
            config.output.destination,
            Some(PathBuf::from("/tmp/session.csv"))
        );

        let pipeline = config.to_pipeline_config();
        assert_eq!(pipeline.queue_capacity, Some(128));
        assert_eq!(pipeline.liveness_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_load_partial_config_uses_defaults() {
        let temp_file = write_config(
            r#"
            [capture]
            duration_secs = 30
        "#,
        );

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.capture.duration_secs, 30.0);
        assert_eq!(config.capture.poll_backoff_ms, 1);
        assert_eq!(config.source, SourceConfig::default());
        assert_eq!(config.pipeline, PipelineSection::default());
        assert_eq!(
            config.poll_strategy(),
            PollStrategy::Backoff(Duration::from_millis(1))
        );
        assert_eq!(config.to_pipeline_config().queue_capacity, None);
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config: Config = toml::from_str(TEMPLATE).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_to_toml_round_trips() {
        let mut config = Config::default();
        config.output.destination = Some(PathBuf::from("out.csv"));
        let text = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);

        let without_destination = Config::default().to_toml().unwrap();
        assert!(!without_destination.contains("destination"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.source.board = "cyton".to_string();
        assert!(matches!(
            config.validate(),
            Err(StreamError::ConfigInvalidValue { key, .. }) if key == "source.board"
        ));

        let mut config = Config::default();
        config.capture.duration_secs = -1.0;
        assert!(matches!(
            config.validate(),
            Err(StreamError::ConfigInvalidValue { key, .. }) if key == "capture.duration_secs"
        ));

        let mut config = Config::default();
        config.pipeline.liveness_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.view_buffer = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_override_board() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_thoughtstream_env();

        set_env("THOUGHTSTREAM_BOARD", "0");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.board_kind().unwrap(), BoardKind::Id(0));
        assert_eq!(config.source.serial_port, ""); // Not overridden

        clear_thoughtstream_env();
    }

    #[test]
    fn test_env_override_all() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_thoughtstream_env();

        set_env("THOUGHTSTREAM_BOARD", "synthetic");
        set_env("THOUGHTSTREAM_SERIAL_PORT", "COM3");
        set_env("THOUGHTSTREAM_DESTINATION", "/data/run.csv");

        let config = Config::default().with_env_overrides();

        assert_eq!(config.board_kind().unwrap(), BoardKind::Synthetic);
        assert_eq!(config.source.serial_port, "COM3");
        assert_eq!(
            config.output.destination,
            Some(PathBuf::from("/data/run.csv"))
        );

        clear_thoughtstream_env();
    }

    #[test]
    fn test_env_override_empty_string_ignored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_thoughtstream_env();

        set_env("THOUGHTSTREAM_DESTINATION", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.output.destination, None);

        clear_thoughtstream_env();
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let temp_file = write_config(
            r#"
            [source
            board = "broken
        "#,
        );

        assert!(Config::load(temp_file.path()).is_err());
    }

    #[test]
    fn test_default_path_is_under_config_dir() {
        if let Ok(path) = Config::default_path() {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("thoughtstream"));
            assert!(path_str.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_thoughtstream_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_or_default_errors_on_invalid_toml() {
        let temp_file = write_config("[source\nboard = \"broken\n");

        let err = Config::load_or_default(temp_file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to load config"));
    }
}
