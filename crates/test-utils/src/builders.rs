#![allow(dead_code)]

use procwatch::config::{ConfigFile, ProgramConfig, SupervisorSection};

/// Builder for roster `ConfigFile`s to simplify test setup.
pub struct RosterBuilder {
    config: ConfigFile,
}

impl RosterBuilder {
    pub fn new() -> Self {
        Self {
            config: ConfigFile {
                supervisor: SupervisorSection::default(),
                program: Vec::new(),
            },
        }
    }

    pub fn with_program(self, path: &str, watched: bool) -> Self {
        self.with_program_args(path, &[], watched)
    }

    pub fn with_program_args(mut self, path: &str, args: &[&str], watched: bool) -> Self {
        self.config.program.push(ProgramConfig {
            path: path.to_string(),
            args: args.iter().map(|s| s.to_string()).collect(),
            watched,
        });
        self
    }

    pub fn with_stale_after_secs(mut self, secs: u64) -> Self {
        self.config.supervisor.stale_after_secs = secs;
        self
    }

    pub fn with_terminate_budget_secs(mut self, secs: u64) -> Self {
        self.config.supervisor.terminate_budget_secs = secs;
        self
    }

    pub fn with_reap_budget_secs(mut self, secs: u64) -> Self {
        self.config.supervisor.reap_budget_secs = secs;
        self
    }

    pub fn build(self) -> ConfigFile {
        self.config
    }
}

impl Default for RosterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
