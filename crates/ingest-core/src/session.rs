//! # Connection Session
//!
//! Per-connection loop. One session runs per admitted connection and reads
//! newline-terminated frames until a terminal condition:
//!
//! ```text
//!            ┌──────── new / duplicate id ────────┐
//!            ↓                                    │
//!       [Reading] ──frame──→ validate ──ok──→ IngestApi
//!        │    │                  │                │
//!  EOF / │    │ terminate        │ rejected       │ sink error
//!  error │    ↓                  ↓                ↓
//!        │ [Shutdown]       [Rejected]        [Closed]
//!        ↓
//!     [Closed]
//! ```
//!
//! Every exit drops the stream (closing the connection) and the admission
//! permit (decrementing `clients`). Nothing is ever written back to the peer.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::domain::{parse_frame, AdmissionPermit, Frame, SessionOutcome};
use crate::listener::ShutdownHandle;
use crate::ports::IngestApi;

/// One admitted connection.
pub struct ConnectionSession<T> {
    reader: BufReader<T>,
    api: Arc<dyn IngestApi>,
    shutdown: ShutdownHandle,
    max_frame_bytes: usize,
    _permit: AdmissionPermit,
}

impl<T> ConnectionSession<T>
where
    T: AsyncRead + Unpin + Send,
{
    pub fn new(
        stream: T,
        api: Arc<dyn IngestApi>,
        shutdown: ShutdownHandle,
        max_frame_bytes: usize,
        permit: AdmissionPermit,
    ) -> Self {
        Self {
            reader: BufReader::new(stream),
            api,
            shutdown,
            max_frame_bytes,
            _permit: permit,
        }
    }

    /// Drive the connection to its end and report why it ended.
    pub async fn run(mut self) -> SessionOutcome {
        let outcome = self.serve().await;

        if outcome.is_abnormal() {
            warn!(outcome = %outcome, "Session closed");
        } else {
            info!(outcome = %outcome, "Session closed");
        }

        outcome
    }

    async fn serve(&mut self) -> SessionOutcome {
        let mut frame = Vec::with_capacity(self.max_frame_bytes);

        loop {
            frame.clear();
            if let Err(outcome) = self.read_frame(&mut frame).await {
                return outcome;
            }

            match parse_frame(&frame) {
                Ok(Frame::Terminate) => {
                    info!("Terminate command received, stopping listener");
                    self.shutdown.trigger();
                    return SessionOutcome::Terminated;
                }
                Ok(Frame::Identifier(id)) => {
                    if self.api.ingest(id, &frame).await.is_err() {
                        return SessionOutcome::SinkFailed;
                    }
                }
                Err(rejection) => {
                    debug!(reason = rejection.reason(), "Frame failed validation");
                    return SessionOutcome::Rejected(rejection);
                }
            }
        }
    }

    /// Read one frame, terminator included, into `frame`.
    async fn read_frame(&mut self, frame: &mut Vec<u8>) -> Result<(), SessionOutcome> {
        let limit = self.max_frame_bytes as u64;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', frame)
            .await
            .map_err(|e| read_failure(&e))?;

        if frame.last() == Some(&b'\n') {
            return Ok(());
        }

        if read as u64 >= limit {
            Err(SessionOutcome::FrameTooLarge {
                limit: self.max_frame_bytes,
            })
        } else {
            // EOF, possibly with a partial frame that is discarded.
            Err(SessionOutcome::PeerClosed)
        }
    }
}

fn read_failure(e: &io::Error) -> SessionOutcome {
    match e.kind() {
        io::ErrorKind::UnexpectedEof => SessionOutcome::PeerClosed,
        kind => SessionOutcome::ReadFailed(kind),
    }
}
