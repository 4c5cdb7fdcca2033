// src/liveness.rs

//! The liveness table: pid -> last-seen-alive timestamp.
//!
//! Invariant: an entry exists if and only if its pid belongs to a watched
//! program currently believed to be running. The supervisor enforces this by
//! removing the entry in the same step in which an exit is reaped, before
//! the OS could possibly reuse the pid.

use std::collections::BTreeMap;
use std::time::Duration;

/// Mapping of running pid to elapsed-time-at-last-heartbeat.
#[derive(Debug, Default)]
pub struct LivenessTable {
    entries: BTreeMap<i32, Duration>,
}

impl LivenessTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refresh (or create) the record for `pid`.
    pub fn mark_alive(&mut self, pid: i32, now: Duration) {
        self.entries.insert(pid, now);
    }

    /// Graceful deregistration; a no-op if `pid` was already absent.
    pub fn deregister(&mut self, pid: i32) {
        self.entries.remove(&pid);
    }

    /// Remove the record for an exited pid. Returns whether it was present;
    /// removing an absent record is a no-op, not an error.
    pub fn remove(&mut self, pid: i32) -> bool {
        self.entries.remove(&pid).is_some()
    }

    pub fn contains(&self, pid: i32) -> bool {
        self.entries.contains_key(&pid)
    }

    pub fn last_seen(&self, pid: i32) -> Option<Duration> {
        self.entries.get(&pid).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, Duration)> + '_ {
        self.entries.iter().map(|(pid, seen)| (*pid, *seen))
    }

    pub fn pids(&self) -> Vec<i32> {
        self.entries.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_alive_refreshes_existing_record() {
        let mut table = LivenessTable::new();
        table.mark_alive(10, Duration::from_secs(1));
        table.mark_alive(10, Duration::from_secs(5));
        assert_eq!(table.last_seen(10), Some(Duration::from_secs(5)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn deregister_is_idempotent() {
        let mut table = LivenessTable::new();
        table.mark_alive(10, Duration::ZERO);
        table.deregister(10);
        assert!(!table.contains(10));
        // absent pid: still a no-op
        table.deregister(10);
        assert!(table.is_empty());
    }

    #[test]
    fn remove_reports_presence() {
        let mut table = LivenessTable::new();
        table.mark_alive(10, Duration::ZERO);
        assert!(table.remove(10));
        assert!(!table.remove(10));
    }
}
