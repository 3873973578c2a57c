//! Command-line arguments.
//!
//! Every flag is optional. Unset flags keep the value resolved from the
//! config file (if any), the environment and the defaults.

use std::path::PathBuf;

use clap::Parser;
use ingest_core::{ConfigError, IngestConfig};

#[derive(Parser, Debug, Default)]
#[command(name = "ingest-node")]
#[command(about = "TCP service that deduplicates 9-digit identifiers into a log file")]
pub struct Args {
    /// TOML config file (also INGEST_CONFIG)
    #[arg(short, long, env = "INGEST_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to listen on (e.g. 127.0.0.1:4000)
    #[arg(short, long)]
    pub addr: Option<String>,

    /// File receiving every newly seen identifier
    #[arg(short, long)]
    pub log_path: Option<PathBuf>,

    /// Maximum concurrent client connections
    #[arg(short, long)]
    pub max_clients: Option<usize>,

    /// Largest accepted frame in bytes
    #[arg(long)]
    pub max_frame_bytes: Option<usize>,

    /// Seconds between console reports
    #[arg(short, long)]
    pub report_interval_secs: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Build the effective configuration: defaults, then the config file,
    /// then environment variables, then these flags.
    pub fn resolve(mut self) -> Result<IngestConfig, ConfigError> {
        let base = match self.config.take() {
            Some(path) => IngestConfig::from_file(path)?,
            None => IngestConfig::default(),
        };
        Ok(self.apply(base.with_env()))
    }

    /// Overlay the flags that were given onto `config`.
    pub fn apply(self, mut config: IngestConfig) -> IngestConfig {
        if let Some(addr) = self.addr {
            config.listen_addr = addr;
        }
        if let Some(path) = self.log_path {
            config.log_path = path;
        }
        if let Some(max) = self.max_clients {
            config.max_clients = max;
        }
        if let Some(bytes) = self.max_frame_bytes {
            config.max_frame_bytes = bytes;
        }
        if let Some(secs) = self.report_interval_secs {
            config.report_interval_secs = secs;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config
    }
}
