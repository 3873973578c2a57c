//! # Ingest Core
//!
//! Connection handling and deduplication for the digit ingestion service.
//!
//! Clients connect over TCP and send newline-terminated frames. Each frame is
//! either a 9-digit identifier or the literal command `terminate`. Identifiers
//! never seen before are appended to the log sink; repeats only bump the
//! `duplicate` counter. Anything else closes the connection.
//!
//! ## Architecture
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): Pure logic and shared state, no I/O
//!   - `Identifier`, `Frame`, `parse_frame`: line validation
//!   - `DedupSet`: every identifier accepted so far
//!   - `CounterBank`: `clients`, `unique`, `duplicate`, `total`
//!   - `AdmissionGate`: hard cap on concurrent sessions
//!
//! - **Ports Layer** (`ports/`): Trait definitions
//!   - `IngestApi`: Driving port (one frame in, one disposition out)
//!   - `LogSink`: Driven port (append-only record target)
//!
//! - **Service Layer** (`service.rs`): `IngestService` implements `IngestApi`
//!
//! - **Connection Layer** (`session.rs`, `listener.rs`): per-connection loop,
//!   accept loop and shutdown signalling
//!
//! - **Adapters Layer** (`adapters/`): `FileLogSink`, `InMemoryLogSink`
//!
//! ## Data Flow
//!
//! ```text
//! Listener ──accept──→ AdmissionGate ──permit──→ ConnectionSession
//!                          │ reject                    │
//!                          ↓                           ↓
//!                     close socket              IngestService
//!                                          ┌───────────┼───────────┐
//!                                          ↓           ↓           ↓
//!                                      DedupSet   CounterBank   LogSink
//! ```
//!
//! ## Invariants
//!
//! - **Write-once**: an identifier reaches the log sink at most once per process.
//! - **Bounded clients**: `clients` stays within `[0, max_clients]`.
//! - **Lifetime total**: `total` never decreases and is never reset.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingest_core::{FileLogSink, IngestConfig, IngestService, Listener};
//! use std::sync::Arc;
//!
//! let config = IngestConfig::default();
//! let sink = Arc::new(FileLogSink::create(&config.log_path).await?);
//! let service = Arc::new(IngestService::new(sink));
//! let listener = Listener::bind(&config, service).await?;
//! let drain = listener.run().await;
//! drain.wait().await;
//! ```

pub mod adapters;
pub mod config;
pub mod domain;
pub mod listener;
pub mod ports;
pub mod reporter;
pub mod service;
pub mod session;

// Re-exports for convenience
pub use adapters::{FileLogSink, InMemoryLogSink};
pub use config::{ConfigError, IngestConfig};
pub use domain::{
    parse_frame, strip_terminator, AdmissionGate, AdmissionPermit, Counter, CounterBank,
    CounterSnapshot, DedupSet, Frame, Identifier, IngestError, Rejection, SessionOutcome,
    SinkError, IDENTIFIER_LEN, TERMINATE_COMMAND,
};
pub use listener::{Listener, SessionDrain, ShutdownHandle};
pub use ports::{Disposition, IngestApi, LogSink};
pub use reporter::{IntervalReport, Reporter};
pub use service::IngestService;
pub use session::ConnectionSession;
