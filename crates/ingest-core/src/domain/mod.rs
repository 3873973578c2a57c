//! Domain module for the ingestion core
//!
//! Contains the identifier grammar, the shared dedup and counter state,
//! the admission gate, and error types.

pub mod admission;
pub mod counters;
pub mod dedup;
pub mod errors;
pub mod identifier;

pub use admission::{AdmissionGate, AdmissionPermit};
pub use counters::{Counter, CounterBank, CounterSnapshot};
pub use dedup::DedupSet;
pub use errors::{IngestError, SessionOutcome, SinkError};
pub use identifier::{
    parse_frame, strip_terminator, Frame, Identifier, Rejection, IDENTIFIER_LEN,
    TERMINATE_COMMAND,
};
