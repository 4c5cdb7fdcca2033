//! Fake capability implementations for driving the supervisor state machine
//! without real processes, pipes or wall-clock time.

use std::collections::{BTreeSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use procwatch::clock::Clock;
use procwatch::errors::{Result, SupervisorError};
use procwatch::heartbeat::{HeartbeatSource, HeartbeatToken};
use procwatch::launcher::{Escalation, ExitEvent, ExitKind, Launcher};

/// Shared inner state of a [`FakeLauncher`].
#[derive(Debug)]
pub struct FakeLauncherState {
    pub next_pid: i32,
    pub launched: Vec<(PathBuf, Vec<String>)>,
    pub killed: Vec<(i32, Escalation)>,
    pub alive: BTreeSet<i32>,
    pub exits: VecDeque<ExitEvent>,
    pub fail_paths: BTreeSet<PathBuf>,
    /// If true, a delivered kill immediately queues the matching exit event,
    /// as a cooperative child would.
    pub exit_on_signal: bool,
}

impl Default for FakeLauncherState {
    fn default() -> Self {
        Self {
            next_pid: 100,
            launched: Vec::new(),
            killed: Vec::new(),
            alive: BTreeSet::new(),
            exits: VecDeque::new(),
            fail_paths: BTreeSet::new(),
            exit_on_signal: false,
        }
    }
}

/// A launcher that:
/// - hands out monotonically increasing fake pids (no reuse),
/// - records every launch and kill,
/// - reports exits scripted by the test via [`push_exit`](Self::push_exit).
///
/// Clones share state, so tests keep a handle while the supervisor owns the
/// launcher.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    state: Arc<Mutex<FakeLauncherState>>,
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the given pid exit; the next reap will report it.
    pub fn push_exit(&self, pid: i32, status: ExitKind) {
        let mut state = self.state.lock().unwrap();
        state.alive.remove(&pid);
        state.exits.push_back(ExitEvent { pid, status });
    }

    /// Make `pid` vanish without queueing an exit event, as if another
    /// reaper raced us; subsequent kills of it fail.
    pub fn mark_gone(&self, pid: i32) {
        self.state.lock().unwrap().alive.remove(&pid);
    }

    /// All launches of `path` will fail from now on.
    pub fn fail_launches_of(&self, path: impl AsRef<Path>) {
        self.state
            .lock()
            .unwrap()
            .fail_paths
            .insert(path.as_ref().to_path_buf());
    }

    pub fn set_exit_on_signal(&self, flag: bool) {
        self.state.lock().unwrap().exit_on_signal = flag;
    }

    pub fn launched(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.state.lock().unwrap().launched.clone()
    }

    pub fn killed(&self) -> Vec<(i32, Escalation)> {
        self.state.lock().unwrap().killed.clone()
    }

    pub fn alive_pids(&self) -> Vec<i32> {
        self.state.lock().unwrap().alive.iter().copied().collect()
    }
}

impl Launcher for FakeLauncher {
    fn launch(&mut self, path: &Path, args: &[String]) -> Result<i32> {
        let mut state = self.state.lock().unwrap();
        if state.fail_paths.contains(path) {
            return Err(SupervisorError::Launch {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "fake launch failure"),
            });
        }
        let pid = state.next_pid;
        state.next_pid += 1;
        state.alive.insert(pid);
        state.launched.push((path.to_path_buf(), args.to_vec()));
        Ok(pid)
    }

    fn kill(&mut self, pid: i32, how: Escalation) -> bool {
        let mut state = self.state.lock().unwrap();
        state.killed.push((pid, how));
        if !state.alive.contains(&pid) {
            return false;
        }
        if state.exit_on_signal {
            state.alive.remove(&pid);
            let signal = match how {
                Escalation::Graceful => 15,
                Escalation::Forced => 9,
            };
            state.exits.push_back(ExitEvent {
                pid,
                status: ExitKind::KilledBySignal(signal),
            });
        }
        true
    }

    fn reap_exited(&mut self) -> Option<ExitEvent> {
        self.state.lock().unwrap().exits.pop_front()
    }

    fn reap_all(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.exits.clear();
        state.alive.is_empty()
    }
}

/// A clock tests advance by hand. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, to: Duration) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn elapsed(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}

/// A heartbeat source fed from a queue the test controls.
#[derive(Debug, Clone, Default)]
pub struct ScriptedHeartbeats {
    queue: Arc<Mutex<VecDeque<HeartbeatToken>>>,
}

impl ScriptedHeartbeats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_alive(&self, pid: i32) {
        self.queue
            .lock()
            .unwrap()
            .push_back(HeartbeatToken::alive(pid));
    }

    pub fn push_deregister(&self, pid: i32) {
        self.queue
            .lock()
            .unwrap()
            .push_back(HeartbeatToken::deregister(pid));
    }
}

impl HeartbeatSource for ScriptedHeartbeats {
    fn try_recv(&mut self) -> io::Result<Option<HeartbeatToken>> {
        Ok(self.queue.lock().unwrap().pop_front())
    }
}

/// A heartbeat source whose reads always fail, for degraded-mode tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingHeartbeats;

impl HeartbeatSource for FailingHeartbeats {
    fn try_recv(&mut self) -> io::Result<Option<HeartbeatToken>> {
        Err(io::Error::other("scripted heartbeat transport failure"))
    }
}
