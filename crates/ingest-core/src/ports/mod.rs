//! Ports Layer
//!
//! Defines the interfaces (traits) for:
//! - Driving Ports (inbound) - what a connection session calls
//! - Driven Ports (outbound) - where accepted identifiers are written

pub mod inbound;
pub mod outbound;

pub use inbound::{Disposition, IngestApi};
pub use outbound::LogSink;
