//! Outbound Ports (Driven Ports)
//!
//! The log sink is the only dependency the core has on the outside world.

use async_trait::async_trait;

use crate::domain::SinkError;

/// Append-only record target (Driven Port)
///
/// Records arrive in acceptance order across all sessions. An implementation
/// must write each record as one unit: bytes of two concurrent appends never
/// interleave.
#[async_trait]
pub trait LogSink: Send + Sync {
    /// Append one record. A failure is not retried by the caller.
    async fn append(&self, record: &[u8]) -> Result<(), SinkError>;

    /// Push buffered bytes to the backing store.
    async fn flush(&self) -> Result<(), SinkError> {
        Ok(())
    }
}
