//! # Ingest Node Library
//!
//! Process wiring for the digit ingestion service, exposed as a library so
//! it can be tested. The entry point is the `main.rs` binary.
//!
//! - `cli` - command-line flags layered over the environment config
//! - `logging` - tracing subscriber setup
//! - `runtime` - log file, listener, reporter and shutdown sequencing

pub mod cli;
pub mod logging;
pub mod runtime;

pub use cli::Args;
pub use logging::init_logging;
pub use runtime::IngestNode;
