//! Ingestion Service
//!
//! Main service implementing [`IngestApi`]. Owns the dedup set and the
//! counter bank and holds the log sink every session writes through.

use async_trait::async_trait;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{Counter, CounterBank, DedupSet, Identifier, SinkError};
use crate::ports::{Disposition, IngestApi, LogSink};

/// Ingestion Service
///
/// For each validated identifier:
/// 1. Claim it in the dedup set
/// 2. If the claim succeeded, append the raw frame to the log sink
/// 3. Bump `total` and `unique` on a successful append, `duplicate` otherwise
///
/// The claim happens before the append. A failed append therefore leaves the
/// identifier marked as seen and it will never be logged by this process.
///
/// ## Thread Safety
///
/// Shared across sessions via `Arc`. Dedup and counters lock internally.
pub struct IngestService {
    dedup: DedupSet,
    counters: Arc<CounterBank>,
    sink: Arc<dyn LogSink>,
}

impl IngestService {
    /// Create a service with a fresh dedup set and counter bank.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self::with_counters(sink, Arc::new(CounterBank::new()))
    }

    /// Create a service sharing an existing counter bank.
    pub fn with_counters(sink: Arc<dyn LogSink>, counters: Arc<CounterBank>) -> Self {
        Self {
            dedup: DedupSet::new(),
            counters,
            sink,
        }
    }

    pub fn counters(&self) -> &Arc<CounterBank> {
        &self.counters
    }

    pub fn dedup(&self) -> &DedupSet {
        &self.dedup
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.sink
    }
}

#[async_trait]
impl IngestApi for IngestService {
    async fn ingest(&self, id: Identifier, record: &[u8]) -> Result<Disposition, SinkError> {
        if !self.dedup.insert_if_absent(id) {
            self.counters.increment(Counter::Duplicate);
            debug!(identifier = %id, "Duplicate identifier");
            return Ok(Disposition::Duplicate);
        }

        if let Err(e) = self.sink.append(record).await {
            warn!(identifier = %id, error = %e, "Failed to append identifier to log sink");
            return Err(e);
        }

        self.counters.increment_each(&[Counter::Total, Counter::Unique]);
        debug!(identifier = %id, "Accepted new identifier");

        Ok(Disposition::Accepted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryLogSink;

    fn id(s: &str) -> Identifier {
        s.parse().unwrap()
    }

    fn make_service() -> (IngestService, Arc<InMemoryLogSink>) {
        let sink = Arc::new(InMemoryLogSink::new());
        let service = IngestService::new(sink.clone());
        (service, sink)
    }

    #[tokio::test]
    async fn test_new_identifier_is_logged() {
        let (service, sink) = make_service();

        let disposition = service.ingest(id("123456789"), b"123456789\n").await.unwrap();

        assert_eq!(disposition, Disposition::Accepted);
        assert_eq!(sink.records(), vec![b"123456789\n".to_vec()]);
        let snap = service.counters().snapshot_all();
        assert_eq!(snap.unique, 1);
        assert_eq!(snap.total, 1);
        assert_eq!(snap.duplicate, 0);
    }

    #[tokio::test]
    async fn test_duplicate_is_counted_not_logged() {
        let (service, sink) = make_service();

        service.ingest(id("123456789"), b"123456789\n").await.unwrap();
        let disposition = service.ingest(id("123456789"), b"123456789\r\n").await.unwrap();

        assert_eq!(disposition, Disposition::Duplicate);
        assert_eq!(sink.len(), 1);
        let snap = service.counters().snapshot_all();
        assert_eq!(snap.unique, 1);
        assert_eq!(snap.duplicate, 1);
        assert_eq!(snap.total, 1);
    }

    #[tokio::test]
    async fn test_record_keeps_original_terminator() {
        let (service, sink) = make_service();

        service.ingest(id("000000042"), b"000000042\r\n").await.unwrap();

        assert_eq!(sink.contents(), b"000000042\r\n".to_vec());
    }

    #[tokio::test]
    async fn test_sink_failure_leaves_identifier_seen() {
        let (service, sink) = make_service();
        sink.fail_appends(true);

        let result = service.ingest(id("111111111"), b"111111111\n").await;
        assert!(matches!(result, Err(SinkError::Unavailable)));
        assert!(service.dedup().contains(&id("111111111")));
        assert_eq!(service.counters().snapshot_all(), Default::default());

        sink.fail_appends(false);
        let retry = service.ingest(id("111111111"), b"111111111\n").await.unwrap();
        assert_eq!(retry, Disposition::Duplicate);
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_sessions_log_once() {
        let (service, sink) = make_service();
        let service = Arc::new(service);

        let tasks: Vec<_> = (0..10)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service.ingest(id("999999999"), b"999999999\n").await.unwrap()
                })
            })
            .collect();

        let mut accepted = 0;
        for task in tasks {
            if task.await.unwrap() == Disposition::Accepted {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(sink.len(), 1);
        let snap = service.counters().snapshot_all();
        assert_eq!(snap.duplicate, 9);
        assert_eq!(snap.total, 1);
    }
}
