//! Adapters Layer
//!
//! Implementations of the [`LogSink`](crate::ports::LogSink) port:
//! - `FileLogSink`: append-only file created at startup
//! - `InMemoryLogSink`: ordered in-memory records, for tests and embedding

pub mod file_sink;
pub mod memory_sink;

pub use file_sink::FileLogSink;
pub use memory_sink::InMemoryLogSink;
