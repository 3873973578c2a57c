//! Configuration for the ingestion service
//!
//! Layers, lowest first: defaults, an optional TOML file, `INGEST_*`
//! environment variables, command-line flags.
//!
//! ```toml
//! listen_addr = "0.0.0.0:4000"
//! log_path = "/var/lib/ingest/numbers.log"
//! max_clients = 5
//! report_interval_secs = 10
//! ```

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

/// Longest frame the protocol allows: `terminate\r\n`.
pub const MIN_FRAME_BOUND: usize = 11;

/// Ingestion service configuration
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    /// Address the listener binds to
    pub listen_addr: String,
    /// Log file receiving every newly seen identifier
    pub log_path: PathBuf,
    /// Admission ceiling for concurrent sessions
    pub max_clients: usize,
    /// Largest frame accepted before the connection is dropped
    pub max_frame_bytes: usize,
    /// Seconds between console reports
    pub report_interval_secs: u64,
    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:4000".to_string(),
            log_path: PathBuf::from("numbers.log"),
            max_clients: 5,
            max_frame_bytes: 64,
            report_interval_secs: 10,
            log_level: "info".to_string(),
        }
    }
}

impl IngestConfig {
    /// Parse a TOML document. Keys left out keep their self.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Overlay environment variables onto `self`. Unset or malformed
    /// variables keep the current value.
    ///
    /// # Environment Variables
    ///
    /// - `INGEST_LISTEN_ADDR`: Listener address
    /// - `INGEST_LOG_PATH`: Log file path
    /// - `INGEST_MAX_CLIENTS`: Admission ceiling
    /// - `INGEST_MAX_FRAME_BYTES`: Frame size bound
    /// - `INGEST_REPORT_INTERVAL_SECS`: Report interval
    /// - `INGEST_LOG_LEVEL` or `RUST_LOG`: Log level
    pub fn with_env(self) -> Self {
        Self {
            listen_addr: env::var("INGEST_LISTEN_ADDR").unwrap_or(self.listen_addr),

            log_path: env::var("INGEST_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(self.log_path),

            max_clients: parse_env("INGEST_MAX_CLIENTS").unwrap_or(self.max_clients),

            max_frame_bytes: parse_env("INGEST_MAX_FRAME_BYTES")
                .unwrap_or(self.max_frame_bytes),

            report_interval_secs: parse_env("INGEST_REPORT_INTERVAL_SECS")
                .unwrap_or(self.report_interval_secs),

            log_level: env::var("INGEST_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or(self.log_level),
        }
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_secs(self.report_interval_secs)
    }

    /// Check the values make a usable service.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_clients == 0 {
            return Err(ConfigError::NoClientSlots);
        }

        if self.max_frame_bytes < MIN_FRAME_BOUND {
            return Err(ConfigError::FrameBoundTooSmall {
                bound: self.max_frame_bytes,
                min: MIN_FRAME_BOUND,
            });
        }

        if self.report_interval_secs == 0 {
            return Err(ConfigError::ZeroReportInterval);
        }

        if self.listen_addr.trim().is_empty() {
            return Err(ConfigError::EmptyListenAddr);
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring malformed environment override");
            None
        }
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max_clients must be at least 1")]
    NoClientSlots,

    #[error("max_frame_bytes {bound} is below the longest legal frame ({min} bytes)")]
    FrameBoundTooSmall { bound: usize, min: usize },

    #[error("report interval must be non-zero")]
    ZeroReportInterval,

    #[error("listen address is empty")]
    EmptyListenAddr,

    #[error("failed to read config file {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    #[error("invalid config file: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = IngestConfig::default();
        assert_eq!(config.listen_addr, "127.0.0.1:4000");
        assert_eq!(config.log_path, PathBuf::from("numbers.log"));
        assert_eq!(config.max_clients, 5);
        assert_eq!(config.report_interval(), Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_clients_rejected() {
        let config = IngestConfig {
            max_clients: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoClientSlots));
    }

    #[test]
    fn test_small_frame_bound_rejected() {
        let config = IngestConfig {
            max_frame_bytes: 10,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::FrameBoundTooSmall { bound: 10, min: 11 })
        );
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = IngestConfig {
            report_interval_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroReportInterval));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = IngestConfig::from_toml_str(
            r#"
            listen_addr = "0.0.0.0:5000"
            max_clients = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.max_clients, 8);
        assert_eq!(config.log_path, PathBuf::from("numbers.log"));
        assert_eq!(config.max_frame_bytes, 64);
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(
            IngestConfig::from_toml_str("").unwrap(),
            IngestConfig::default()
        );
    }

    #[test]
    fn test_unknown_toml_key_rejected() {
        let err = IngestConfig::from_toml_str("max_client = 3").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_wrong_toml_type_rejected() {
        let err = IngestConfig::from_toml_str("max_clients = \"five\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ingest.toml");
        fs::write(&path, "log_path = \"/tmp/ids.log\"\nreport_interval_secs = 5\n").unwrap();

        let config = IngestConfig::from_file(&path).unwrap();
        assert_eq!(config.log_path, PathBuf::from("/tmp/ids.log"));
        assert_eq!(config.report_interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_missing_file_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = IngestConfig::from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
