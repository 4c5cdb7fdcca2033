// src/clock.rs

//! The supervisor's monotonic clock.
//!
//! All staleness and deadline computations use elapsed time since the
//! supervisor started, never wall-clock time. The clock is a narrow trait so
//! tests can substitute a manually driven implementation.

use std::time::Duration;

use tokio::time::Instant;

/// Monotonic elapsed time since the supervisor started.
pub trait Clock {
    fn elapsed(&self) -> Duration;
}

/// Production clock backed by `tokio::time::Instant`.
///
/// Using the tokio instant (rather than `std::time::Instant`) means tests
/// running under a paused runtime can fast-forward through staleness windows
/// and termination budgets.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    started: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
