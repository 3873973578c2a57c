//! Named activity counters
//!
//! The counter set is closed: `clients`, `unique`, `duplicate`, `total`.
//! Names are an enum, so an unknown counter cannot be expressed at all.
//!
//! | Counter | Kind | Reset by |
//! |---------|------|----------|
//! | `clients` | live gauge of admitted sessions | never (admission permits balance it) |
//! | `unique` | interval | reporter |
//! | `duplicate` | interval | reporter |
//! | `total` | lifetime, non-decreasing | never |

use parking_lot::Mutex;
use std::fmt;

/// One of the four counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    Clients,
    Unique,
    Duplicate,
    Total,
}

impl Counter {
    pub const ALL: [Counter; 4] = [
        Counter::Clients,
        Counter::Unique,
        Counter::Duplicate,
        Counter::Total,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Counter::Clients => "clients",
            Counter::Unique => "unique",
            Counter::Duplicate => "duplicate",
            Counter::Total => "total",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Point-in-time copy of every counter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub clients: i64,
    pub unique: i64,
    pub duplicate: i64,
    pub total: i64,
}

/// Thread-safe bank of the four counters.
///
/// Every operation takes one global lock. The values are signed so that a
/// bookkeeping bug shows up as a negative number instead of wrapping.
#[derive(Debug, Default)]
pub struct CounterBank {
    values: Mutex<[i64; 4]>,
}

impl CounterBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&self, counter: Counter) {
        self.values.lock()[counter.slot()] += 1;
    }

    pub fn decrement(&self, counter: Counter) {
        self.values.lock()[counter.slot()] -= 1;
    }

    /// Set the counter to zero and return the value it held.
    pub fn reset(&self, counter: Counter) -> i64 {
        std::mem::take(&mut self.values.lock()[counter.slot()])
    }

    /// Increment several counters in one critical section.
    pub fn increment_each(&self, counters: &[Counter]) {
        let mut values = self.values.lock();
        for counter in counters {
            values[counter.slot()] += 1;
        }
    }

    /// Close a reporting interval.
    ///
    /// Returns every counter as it stood and zeroes `unique` and `duplicate`,
    /// all under one lock.
    pub fn take_interval(&self) -> CounterSnapshot {
        let mut values = self.values.lock();
        let snapshot = read_all(&values);
        values[Counter::Unique.slot()] = 0;
        values[Counter::Duplicate.slot()] = 0;
        snapshot
    }

    /// Current value of one counter.
    pub fn snapshot(&self, counter: Counter) -> i64 {
        self.values.lock()[counter.slot()]
    }

    /// Increment `counter` only while it is below `ceiling`.
    ///
    /// Check and increment share one critical section. Returns whether the
    /// increment happened.
    pub fn increment_below(&self, counter: Counter, ceiling: i64) -> bool {
        let mut values = self.values.lock();
        let slot = &mut values[counter.slot()];
        if *slot >= ceiling {
            return false;
        }
        *slot += 1;
        true
    }

    /// Consistent copy of all counters taken under a single lock.
    pub fn snapshot_all(&self) -> CounterSnapshot {
        read_all(&self.values.lock())
    }
}

fn read_all(values: &[i64; 4]) -> CounterSnapshot {
    CounterSnapshot {
        clients: values[Counter::Clients.slot()],
        unique: values[Counter::Unique.slot()],
        duplicate: values[Counter::Duplicate.slot()],
        total: values[Counter::Total.slot()],
    }
}
