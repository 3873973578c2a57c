//! Set of identifiers already accepted by this process.
//!
//! The set only grows. There is no removal and nothing is persisted, so a
//! restart starts from an empty set.

use parking_lot::Mutex;
use std::collections::HashSet;

use super::identifier::Identifier;

/// Thread-safe membership set for accepted identifiers.
///
/// Each instance is independent; the service owns one and hands it to
/// every session, so tests can build as many as they like.
///
/// ```
/// use ingest_core::{DedupSet, Identifier};
///
/// let seen = DedupSet::new();
/// let id: Identifier = "123456789".parse().unwrap();
///
/// assert!(seen.insert_if_absent(id));
/// assert!(!seen.insert_if_absent(id));
/// ```
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: Mutex<HashSet<Identifier>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has been inserted before.
    pub fn contains(&self, id: &Identifier) -> bool {
        self.seen.lock().contains(id)
    }

    /// Insert `id` unless it is already present.
    ///
    /// Returns `true` iff this call performed the insertion. The check and
    /// the insert happen under one lock, so two sessions racing on the same
    /// identifier cannot both see `true`.
    pub fn insert_if_absent(&self, id: Identifier) -> bool {
        self.seen.lock().insert(id)
    }

    /// Number of distinct identifiers seen.
    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}
