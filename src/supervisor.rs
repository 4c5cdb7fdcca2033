// src/supervisor.rs

//! The supervisor state machine.
//!
//! States run `Initializing -> Running -> Terminating -> Closed`. The loop
//! composes four capabilities behind narrow seams: a [`Launcher`] for
//! spawn/kill/reap, a [`HeartbeatSource`] for liveness tokens, a [`Clock`]
//! for staleness and deadlines, and the roster loaded into the
//! [`ProgramRegistry`]. There is a single logical task; every wait is either
//! a non-blocking poll plus sleep or bounded by an explicit deadline.
//!
//! Ordering between a heartbeat token and an exit notification for the same
//! pid is not guaranteed, so both paths treat "record already gone" as a
//! no-op.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::clock::Clock;
use crate::config::ConfigFile;
use crate::errors::{Result, SupervisorError};
use crate::heartbeat::{HeartbeatSource, TokenKind};
use crate::launcher::{Escalation, ExitEvent, Launcher};
use crate::liveness::LivenessTable;
use crate::policy::RestartPolicy;
use crate::registry::ProgramRegistry;

/// Lifecycle timing constants; all overridable from `[supervisor]` config.
#[derive(Debug, Clone)]
pub struct Settings {
    pub inspect_period: Duration,
    pub stale_after: Duration,
    pub terminate_budget: Duration,
    pub reap_budget: Duration,
    pub startup_poll: Duration,
    pub max_tokens_per_tick: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            inspect_period: Duration::from_secs(3),
            stale_after: Duration::from_secs(60),
            terminate_budget: Duration::from_secs(120),
            reap_budget: Duration::from_secs(180),
            startup_poll: Duration::from_millis(100),
            max_tokens_per_tick: 1000,
        }
    }
}

/// Supervisor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Initializing,
    Running,
    Terminating,
    Closed,
}

/// The monitoring loop and its owned state.
///
/// The supervisor exclusively owns the liveness table and drives all
/// mutation of program run state; nothing else touches either.
pub struct Supervisor<L: Launcher, C: Clock> {
    launcher: L,
    clock: C,
    channel: Option<Box<dyn HeartbeatSource>>,
    registry: ProgramRegistry,
    liveness: LivenessTable,
    policy: RestartPolicy,
    settings: Settings,
    shutdown: watch::Receiver<bool>,
    /// Exits reaped during startup confirmation, replayed into the first
    /// monitoring tick so the exit trigger still fires for them.
    pending_exits: VecDeque<ExitEvent>,
    degraded: bool,
    state: State,
}

impl<L: Launcher, C: Clock> Supervisor<L, C> {
    pub fn new(
        launcher: L,
        clock: C,
        channel: Box<dyn HeartbeatSource>,
        settings: Settings,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let policy = RestartPolicy::new(settings.stale_after);
        Self {
            launcher,
            clock,
            channel: Some(channel),
            registry: ProgramRegistry::new(),
            liveness: LivenessTable::new(),
            policy,
            settings,
            shutdown,
            pending_exits: VecDeque::new(),
            degraded: false,
            state: State::Initializing,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn liveness(&self) -> &LivenessTable {
        &self.liveness
    }

    pub fn registry(&self) -> &ProgramRegistry {
        &self.registry
    }

    /// True once the heartbeat channel has failed and the supervisor fell
    /// back to exit-notification-only tracking.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Initializing state: load the roster, launch everything, and wait for
    /// each watched program's first heartbeat.
    ///
    /// Any failure here aborts startup; no partial supervision begins.
    pub async fn init(&mut self, cfg: &ConfigFile) -> Result<()> {
        self.registry.load(cfg);
        info!(programs = self.registry.len(), "roster loaded");

        let pending = self.start_all()?;
        self.confirm_startup(pending).await;
        Ok(())
    }

    /// Running -> Terminating -> Closed.
    ///
    /// Returns `Ok(())` after an orderly shutdown request, or the fatal
    /// runtime error that ended monitoring; termination and closing run in
    /// both cases.
    pub async fn run(&mut self) -> Result<()> {
        self.state = State::Running;
        info!("supervisor running");

        let outcome = self.monitor_loop().await;

        self.state = State::Terminating;
        let clean = self.terminate().await;

        self.state = State::Closed;
        self.close().await;

        if clean && outcome.is_ok() {
            info!("supervisor shut down cleanly");
        }
        outcome
    }

    async fn monitor_loop(&mut self) -> Result<()> {
        loop {
            if *self.shutdown.borrow() {
                info!("termination requested, leaving monitoring loop");
                return Ok(());
            }

            self.tick()?;

            let mut shutdown = self.shutdown.clone();
            let period = self.settings.inspect_period;
            tokio::select! {
                _ = tokio::time::sleep(period) => {}
                // A closed sender must not turn this into a busy loop.
                _ = async {
                    if shutdown.changed().await.is_err() {
                        std::future::pending::<()>().await;
                    }
                } => {}
            }
        }
    }

    /// One monitoring pass: drain heartbeats, drain exits, apply the
    /// staleness trigger, perform the decided restarts.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.clock.elapsed();
        self.drain_heartbeats(now);

        // (registry index, old pid) pairs decided for restart this tick.
        let mut to_restart: Vec<(usize, i32)> = Vec::new();

        // Exit trigger. Exits observed during startup confirmation first.
        let mut exits: Vec<ExitEvent> = self.pending_exits.drain(..).collect();
        while let Some(event) = self.launcher.reap_exited() {
            exits.push(event);
        }
        for event in exits {
            // Removing the record in the same step the exit is confirmed
            // closes the pid-reuse window.
            self.liveness.remove(event.pid);
            match self.registry.position_by_pid(event.pid) {
                Some(idx) => {
                    let Some(prog) = self.registry.get_mut(idx) else {
                        continue;
                    };
                    prog.pid = None;
                    if prog.watched {
                        info!(
                            pid = event.pid,
                            status = ?event.status,
                            path = %prog.path.display(),
                            "watched program exited"
                        );
                        to_restart.push((idx, event.pid));
                    } else {
                        debug!(
                            pid = event.pid,
                            status = ?event.status,
                            path = %prog.path.display(),
                            "unwatched program exited"
                        );
                    }
                }
                None => {
                    debug!(pid = event.pid, "exit notification for unknown pid");
                }
            }
        }

        // Staleness trigger. A process that already exited this tick is not
        // re-killed.
        if !self.degraded {
            for pid in self.policy.stale_pids(&self.liveness, now) {
                if to_restart.iter().any(|(_, p)| *p == pid) {
                    continue;
                }
                if self.launcher.kill(pid, Escalation::Forced) {
                    warn!(pid, "killed stale program for restart");
                    self.liveness.remove(pid);
                    if let Some(idx) = self.registry.position_by_pid(pid) {
                        to_restart.push((idx, pid));
                    }
                } else {
                    debug!(pid, "stale kill not delivered; target likely exited already");
                }
            }
        }

        for (idx, old_pid) in to_restart {
            self.restart_program(idx, old_pid, now)?;
        }
        Ok(())
    }

    /// Launch every roster program; watched pids are seeded into the
    /// liveness table (start time counts as the first sighting) and returned
    /// as the set awaiting startup confirmation.
    fn start_all(&mut self) -> Result<HashSet<i32>> {
        let now = self.clock.elapsed();
        let mut pending = HashSet::new();

        let Self {
            launcher,
            registry,
            liveness,
            ..
        } = self;

        for prog in registry.iter_mut() {
            match launcher.launch(&prog.path, &prog.args) {
                Ok(pid) => {
                    prog.pid = Some(pid);
                    info!(
                        pid,
                        path = %prog.path.display(),
                        watched = prog.watched,
                        "launched program"
                    );
                    if prog.watched {
                        liveness.mark_alive(pid, now);
                        pending.insert(pid);
                    }
                }
                Err(err) => {
                    error!(
                        path = %prog.path.display(),
                        error = %err,
                        "program failed to launch, aborting startup"
                    );
                    return Err(err);
                }
            }
        }
        Ok(pending)
    }

    /// Block (in short polls) until every watched program has heartbeated
    /// once, exited, or a termination request arrives.
    async fn confirm_startup(&mut self, mut pending: HashSet<i32>) {
        while !pending.is_empty() {
            if *self.shutdown.borrow() {
                debug!("termination requested during startup confirmation");
                return;
            }

            let now = self.clock.elapsed();
            for pid in self.drain_heartbeats(now) {
                pending.remove(&pid);
            }
            if self.degraded {
                warn!("cannot confirm startup without heartbeats, proceeding degraded");
                return;
            }

            while let Some(event) = self.launcher.reap_exited() {
                pending.remove(&event.pid);
                self.liveness.remove(event.pid);
                self.pending_exits.push_back(event);
            }

            if pending.is_empty() {
                break;
            }
            tokio::time::sleep(self.settings.startup_poll).await;
        }
        info!("all watched programs confirmed started");
    }

    /// Drain up to `max_tokens_per_tick` tokens, applying them to the
    /// liveness table. Returns the pids refreshed by alive-pings.
    fn drain_heartbeats(&mut self, now: Duration) -> Vec<i32> {
        let mut seen = Vec::new();
        if self.degraded {
            return seen;
        }

        let Self {
            channel,
            liveness,
            registry,
            settings,
            degraded,
            ..
        } = self;
        let Some(channel) = channel.as_mut() else {
            return seen;
        };

        for _ in 0..settings.max_tokens_per_tick {
            match channel.try_recv() {
                Ok(Some(token)) => match token.kind() {
                    Some(TokenKind::Alive(pid)) => {
                        // Every child inherits the pipe fd, so unwatched
                        // programs can ping too; observing them would put
                        // fire-and-forget processes under the staleness
                        // trigger.
                        if registry.find_by_pid(pid).is_some_and(|prog| prog.watched) {
                            liveness.mark_alive(pid, now);
                            seen.push(pid);
                        } else {
                            debug!(pid, "heartbeat for unknown or unwatched pid ignored");
                        }
                    }
                    Some(TokenKind::Deregister(pid)) => {
                        debug!(pid, "deregistered from observation");
                        liveness.deregister(pid);
                    }
                    None => debug!("zero-valued heartbeat token ignored"),
                },
                Ok(None) => break,
                Err(err) => {
                    warn!(
                        error = %err,
                        "heartbeat channel read failed; degrading to exit-only liveness tracking"
                    );
                    *degraded = true;
                    break;
                }
            }
        }
        seen
    }

    fn restart_program(&mut self, idx: usize, old_pid: i32, now: Duration) -> Result<()> {
        let (path, args) = match self.registry.get_mut(idx) {
            Some(prog) => (prog.path.clone(), prog.args.clone()),
            None => return Ok(()),
        };

        match self.launcher.launch(&path, &args) {
            Ok(new_pid) => {
                if let Some(prog) = self.registry.get_mut(idx) {
                    prog.pid = Some(new_pid);
                }
                self.liveness.mark_alive(new_pid, now);
                info!(old_pid, new_pid, path = %path.display(), "restarted program");
                Ok(())
            }
            Err(SupervisorError::Launch { source, .. }) => {
                error!(
                    pid = old_pid,
                    path = %path.display(),
                    error = %source,
                    "restart failed, ending supervision"
                );
                Err(SupervisorError::Restart {
                    path,
                    pid: old_pid,
                    source,
                })
            }
            Err(other) => Err(other),
        }
    }

    /// Terminating state: signal every registered program once a second and
    /// wait, bounded, for all children to be reaped.
    ///
    /// Returns true if everything exited within the budget.
    pub async fn terminate(&mut self) -> bool {
        let started = self.clock.elapsed();
        let mut first_sweep = true;

        loop {
            self.signal_all(first_sweep);
            first_sweep = false;

            tokio::time::sleep(Duration::from_secs(1)).await;

            while let Some(event) = self.launcher.reap_exited() {
                self.liveness.remove(event.pid);
                info!(pid = event.pid, status = ?event.status, "program terminated");
            }
            if self.launcher.reap_all() {
                info!("all programs terminated");
                return true;
            }
            if self.clock.elapsed() - started >= self.settings.terminate_budget {
                error!(
                    budget_secs = self.settings.terminate_budget.as_secs(),
                    "programs failed to terminate within budget"
                );
                return false;
            }
        }
    }

    /// Closed state: release the channel, then a best-effort bounded wait
    /// for any remaining children.
    pub async fn close(&mut self) {
        self.channel = None;

        let started = self.clock.elapsed();
        while !self.launcher.reap_all() {
            if self.clock.elapsed() - started >= self.settings.reap_budget {
                warn!("giving up waiting for remaining children to be reaped");
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// Graceful termination signal to every pid the registry or the
    /// liveness table knows about; the union covers pids racing between the
    /// two structures.
    fn signal_all(&mut self, first: bool) {
        let mut pids = self.registry.running_pids();
        for pid in self.liveness.pids() {
            if !pids.contains(&pid) {
                pids.push(pid);
            }
        }

        for pid in pids {
            let delivered = self.launcher.kill(pid, Escalation::Graceful);
            if first {
                info!(pid, delivered, "sent termination signal");
            } else {
                debug!(pid, delivered, "re-sent termination signal");
            }
        }
    }
}
