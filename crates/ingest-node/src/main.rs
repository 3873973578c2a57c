//! # Ingest Node
//!
//! Entry point for the digit ingestion service.
//!
//! ## Startup Sequence
//!
//! 1. Resolve configuration (defaults, config file, environment, flags)
//! 2. Install logging
//! 3. Bind the listener, then create the log file (fatal on failure)
//! 4. Serve until a client sends `terminate` or Ctrl+C arrives

use anyhow::{Context, Result};
use clap::Parser;

use ingest_node::{init_logging, Args, IngestNode};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Args::parse()
        .resolve()
        .context("Failed to load configuration")?;

    init_logging(&config.log_level)?;

    let node = IngestNode::new(config).await?;
    node.run().await
}
