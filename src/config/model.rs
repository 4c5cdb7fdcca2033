// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::supervisor::Settings;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [supervisor]
/// inspect_period_secs = 3
/// stale_after_secs = 60
///
/// [[program]]
/// path = "/usr/local/bin/some_app"
/// args = ["-t", "25", "-s1"]
/// watched = true
/// ```
///
/// The `[supervisor]` section is optional and every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    /// Lifecycle timing constants from `[supervisor]`.
    #[serde(default)]
    pub supervisor: SupervisorSection,

    /// Ordered roster of programs from `[[program]]` entries.
    #[serde(default)]
    pub program: Vec<ProgramConfig>,
}

/// `[supervisor]` section: every lifecycle timing constant is overridable.
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSection {
    /// Seconds between monitoring ticks in the Running state.
    #[serde(default = "default_inspect_period_secs")]
    pub inspect_period_secs: u64,

    /// A watched process whose last heartbeat is *older* than this is
    /// considered hung and gets killed and restarted.
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,

    /// Wall-clock budget for the orderly termination sweep at shutdown.
    #[serde(default = "default_terminate_budget_secs")]
    pub terminate_budget_secs: u64,

    /// Additional budget, after termination, for reaping any stragglers.
    #[serde(default = "default_reap_budget_secs")]
    pub reap_budget_secs: u64,

    /// Poll interval while waiting for each watched program's first
    /// heartbeat during startup confirmation.
    #[serde(default = "default_startup_poll_ms")]
    pub startup_poll_ms: u64,

    /// Upper bound on heartbeat tokens drained per tick, so a flooding
    /// writer cannot keep a tick from terminating.
    #[serde(default = "default_max_tokens_per_tick")]
    pub max_tokens_per_tick: usize,
}

fn default_inspect_period_secs() -> u64 {
    3
}

fn default_stale_after_secs() -> u64 {
    60
}

fn default_terminate_budget_secs() -> u64 {
    120
}

fn default_reap_budget_secs() -> u64 {
    180
}

fn default_startup_poll_ms() -> u64 {
    100
}

fn default_max_tokens_per_tick() -> usize {
    1000
}

impl Default for SupervisorSection {
    fn default() -> Self {
        Self {
            inspect_period_secs: default_inspect_period_secs(),
            stale_after_secs: default_stale_after_secs(),
            terminate_budget_secs: default_terminate_budget_secs(),
            reap_budget_secs: default_reap_budget_secs(),
            startup_poll_ms: default_startup_poll_ms(),
            max_tokens_per_tick: default_max_tokens_per_tick(),
        }
    }
}

impl SupervisorSection {
    /// Convert the raw integer fields into the supervisor's `Settings`.
    pub fn settings(&self) -> Settings {
        Settings {
            inspect_period: Duration::from_secs(self.inspect_period_secs),
            stale_after: Duration::from_secs(self.stale_after_secs),
            terminate_budget: Duration::from_secs(self.terminate_budget_secs),
            reap_budget: Duration::from_secs(self.reap_budget_secs),
            startup_poll: Duration::from_millis(self.startup_poll_ms),
            max_tokens_per_tick: self.max_tokens_per_tick,
        }
    }
}

/// One `[[program]]` roster entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ProgramConfig {
    /// Executable path.
    pub path: String,

    /// Ordered command-line arguments.
    #[serde(default)]
    pub args: Vec<String>,

    /// Whether liveness is tracked via heartbeats. Unwatched programs are
    /// launched fire-and-forget and never restarted.
    #[serde(default = "default_watched")]
    pub watched: bool,
}

fn default_watched() -> bool {
    true
}
