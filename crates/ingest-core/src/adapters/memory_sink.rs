//! In-memory log sink.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::SinkError;
use crate::ports::LogSink;

/// Keeps every appended record in arrival order.
///
/// Appends can be switched to fail, which lets tests drive the
/// persistence-failure path of a session.
#[derive(Debug, Default)]
pub struct InMemoryLogSink {
    records: Mutex<Vec<Vec<u8>>>,
    failing: AtomicBool,
}

impl InMemoryLogSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent appends fail with [`SinkError::Unavailable`].
    pub fn fail_appends(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    /// Copy of all records, oldest first.
    pub fn records(&self) -> Vec<Vec<u8>> {
        self.records.lock().clone()
    }

    /// All records concatenated, as they would appear in a file.
    pub fn contents(&self) -> Vec<u8> {
        self.records.lock().concat()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl LogSink for InMemoryLogSink {
    async fn append(&self, record: &[u8]) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable);
        }
        self.records.lock().push(record.to_vec());
        Ok(())
    }
}
