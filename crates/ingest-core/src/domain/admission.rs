//! Admission control for concurrent sessions.
//!
//! The gate is backed by the `clients` counter. Admission is one atomic
//! check-and-increment, so the ceiling is a hard cap even under bursts of
//! simultaneous connects. A permit gives the slot back when dropped.

use std::sync::Arc;

use super::counters::{Counter, CounterBank};

/// Tracks live sessions against a fixed ceiling.
#[derive(Clone, Debug)]
pub struct AdmissionGate {
    counters: Arc<CounterBank>,
    ceiling: usize,
}

impl AdmissionGate {
    pub fn new(counters: Arc<CounterBank>, ceiling: usize) -> Self {
        Self { counters, ceiling }
    }

    /// Claim a slot, or `None` when the ceiling is reached.
    ///
    /// Rejection touches no counter.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        let ceiling = i64::try_from(self.ceiling).unwrap_or(i64::MAX);
        if self.counters.increment_below(Counter::Clients, ceiling) {
            Some(AdmissionPermit {
                counters: Arc::clone(&self.counters),
            })
        } else {
            None
        }
    }

    /// Sessions currently holding a permit.
    pub fn active(&self) -> i64 {
        self.counters.snapshot(Counter::Clients)
    }

    pub fn ceiling(&self) -> usize {
        self.ceiling
    }
}

/// One admitted session's slot. Dropping it decrements `clients`.
#[derive(Debug)]
#[must_use = "dropping the permit releases the slot immediately"]
pub struct AdmissionPermit {
    counters: Arc<CounterBank>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.counters.decrement(Counter::Clients);
    }
}
