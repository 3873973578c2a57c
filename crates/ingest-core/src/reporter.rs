//! Periodic activity report.
//!
//! Every interval the reporter reads `total`, resets `unique` and
//! `duplicate`, and emits one line. `total` is never reset.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::info;

use crate::domain::CounterBank;

/// Counts observed during one reporting interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IntervalReport {
    pub unique: i64,
    pub duplicate: i64,
    pub total: i64,
}

impl fmt::Display for IntervalReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Received {} unique numbers, {} duplicates. Unique total: {}",
            self.unique, self.duplicate, self.total
        )
    }
}

/// Reads and resets the interval counters on a timer.
pub struct Reporter {
    counters: Arc<CounterBank>,
    interval: Duration,
}

impl Reporter {
    pub fn new(counters: Arc<CounterBank>, interval: Duration) -> Self {
        Self { counters, interval }
    }

    /// Take one report, zeroing the interval counters.
    pub fn tick(&self) -> IntervalReport {
        let taken = self.counters.take_interval();
        IntervalReport {
            unique: taken.unique,
            duplicate: taken.duplicate,
            total: taken.total,
        }
    }

    /// Report immediately, then once per interval, until `stop` resolves.
    ///
    /// A final report covering the partial interval is emitted on stop.
    pub async fn run<F>(self, stop: F)
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(stop);

        loop {
            tokio::select! {
                _ = &mut stop => break,
                _ = ticker.tick() => emit(self.tick()),
            }
        }

        emit(self.tick());
    }
}

fn emit(report: IntervalReport) {
    info!(
        unique = report.unique,
        duplicate = report.duplicate,
        total = report.total,
        "{}",
        report
    );
}
