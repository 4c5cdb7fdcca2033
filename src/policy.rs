// src/policy.rs

//! Restart/staleness decisions.
//!
//! Pure logic over the clock and the liveness table; no IO here. The two
//! triggers are independent:
//!
//! - exit trigger: a reaped pid is restarted iff its program is watched;
//! - staleness trigger: a record older than the threshold marks its process
//!   for a forced kill and restart.
//!
//! Exit-trigger restarts take priority over staleness kills for the same pid
//! within one tick; a process that already exited is not re-killed.

use std::time::Duration;

use crate::liveness::LivenessTable;

#[derive(Debug, Clone, Copy)]
pub struct RestartPolicy {
    /// Allowed heartbeat age before a process counts as hung.
    pub stale_after: Duration,
}

impl RestartPolicy {
    pub fn new(stale_after: Duration) -> Self {
        Self { stale_after }
    }

    /// Staleness is strict: a record whose last heartbeat sits exactly at
    /// `now - stale_after` is still considered alive.
    pub fn is_stale(&self, last_seen: Duration, now: Duration) -> bool {
        match now.checked_sub(self.stale_after) {
            Some(cutoff) => last_seen < cutoff,
            // The supervisor has not been up for a full threshold yet.
            None => false,
        }
    }

    /// Pids whose records have gone stale at `now`, in table order.
    pub fn stale_pids(&self, table: &LivenessTable, now: Duration) -> Vec<i32> {
        table
            .iter()
            .filter(|(_, seen)| self.is_stale(*seen, now))
            .map(|(pid, _)| pid)
            .collect()
    }
}
