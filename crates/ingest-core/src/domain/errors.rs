//! Error types for the ingestion core

use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::identifier::Rejection;
use crate::config::ConfigError;

/// Startup failures. Any of these keeps the process from serving.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("cannot bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot open log sink {path:?}: {source}")]
    OpenSink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Failure to append a record to the log sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("log write failed: {0}")]
    Write(#[from] io::Error),

    #[error("log sink unavailable")]
    Unavailable,
}

/// How a connection session ended.
#[derive(Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The peer closed the stream, possibly mid-frame.
    PeerClosed,
    /// Reading from the stream failed.
    ReadFailed(io::ErrorKind),
    /// A frame grew past the size bound without a newline.
    FrameTooLarge { limit: usize },
    /// A frame failed validation.
    Rejected(Rejection),
    /// Appending a new identifier to the log sink failed.
    SinkFailed,
    /// The peer sent `terminate`.
    Terminated,
}

impl SessionOutcome {
    /// Whether the session ended because the client misbehaved or the
    /// server failed, as opposed to an orderly close.
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, SessionOutcome::PeerClosed | SessionOutcome::Terminated)
    }
}

impl fmt::Display for SessionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionOutcome::PeerClosed => f.write_str("peer closed"),
            SessionOutcome::ReadFailed(kind) => write!(f, "read failed: {kind}"),
            SessionOutcome::FrameTooLarge { limit } => {
                write!(f, "frame exceeds {limit} bytes")
            }
            SessionOutcome::Rejected(rejection) => write!(f, "rejected: {rejection}"),
            SessionOutcome::SinkFailed => f.write_str("log sink write failed"),
            SessionOutcome::Terminated => f.write_str("terminate command"),
        }
    }
}
