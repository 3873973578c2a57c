//! File-backed log sink.
//!
//! The file is created (or truncated) once at startup. Each record is written
//! and flushed while holding the sink's lock, so records from concurrent
//! sessions land whole and in acceptance order.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use tracing::info;

use crate::domain::{IngestError, SinkError};
use crate::ports::LogSink;

/// Append-only log file.
#[derive(Debug)]
pub struct FileLogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLogSink {
    /// Create the log file, truncating any previous contents.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, IngestError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)
            .await
            .map_err(|source| IngestError::OpenSink {
                path: path.clone(),
                source,
            })?;

        info!(path = %path.display(), "Log sink opened");

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    async fn append(&self, record: &[u8]) -> Result<(), SinkError> {
        let mut file = self.file.lock().await;
        file.write_all(record).await?;
        file.flush().await?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), SinkError> {
        let mut file = self.file.lock().await;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.log");
        std::fs::write(&path, b"stale contents\n").unwrap();

        let sink = FileLogSink::create(&path).await.unwrap();
        sink.flush().await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"");
        assert_eq!(sink.path(), path.as_path());
    }

    #[tokio::test]
    async fn test_append_writes_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.log");
        let sink = FileLogSink::create(&path).await.unwrap();

        sink.append(b"123456789\n").await.unwrap();
        sink.append(b"987654321\r\n").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"123456789\n987654321\r\n");
    }

    #[tokio::test]
    async fn test_concurrent_appends_do_not_interleave() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("numbers.log");
        let sink = Arc::new(FileLogSink::create(&path).await.unwrap());

        let tasks: Vec<_> = (0..50u32)
            .map(|n| {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    let record = format!("{:09}\n", n);
                    sink.append(record.as_bytes()).await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 50);
        assert!(lines.iter().all(|l| l.len() == 9));
        lines.sort();
        lines.dedup();
        assert_eq!(lines.len(), 50);
    }

    #[tokio::test]
    async fn test_create_in_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("numbers.log");

        let err = FileLogSink::create(&path).await.unwrap_err();
        assert!(matches!(err, IngestError::OpenSink { .. }));
    }
}
