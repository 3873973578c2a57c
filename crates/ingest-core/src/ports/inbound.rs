//! Inbound Ports (Driving Ports)
//!
//! The API a connection session drives once a frame has validated.

use async_trait::async_trait;

use crate::domain::{Identifier, SinkError};

/// What happened to a validated identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// First sighting: recorded in the log sink.
    Accepted,
    /// Seen before: counted, not logged.
    Duplicate,
}

/// Primary ingestion API
#[async_trait]
pub trait IngestApi: Send + Sync {
    /// Deduplicate `id` and, if it is new, append `record` to the log sink.
    ///
    /// `record` is the frame exactly as received, terminator included.
    /// On `Err` the identifier stays marked as seen.
    async fn ingest(&self, id: Identifier, record: &[u8]) -> Result<Disposition, SinkError>;
}
