// src/registry.rs

//! The roster of supervised programs and their current run state.
//!
//! The registry owns the ordered program list. It is loaded once at startup
//! and mutated only by the supervisor loop (pid updates on every (re)start);
//! entries are never removed during a run.

use std::path::PathBuf;

use crate::config::ConfigFile;

/// One supervised program and its current run state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisedProgram {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Whether liveness is tracked via heartbeats (vs fire-and-forget).
    pub watched: bool,
    /// Current process id; `None` when not running.
    pub pid: Option<i32>,
}

/// Ordered roster of supervised programs.
#[derive(Debug, Default)]
pub struct ProgramRegistry {
    programs: Vec<SupervisedProgram>,
}

impl ProgramRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the roster from configuration, clearing any previous state.
    ///
    /// Idempotent by construction; used only at startup.
    pub fn load(&mut self, cfg: &ConfigFile) {
        self.programs.clear();
        for entry in &cfg.program {
            self.programs.push(SupervisedProgram {
                path: PathBuf::from(&entry.path),
                args: entry.args.clone(),
                watched: entry.watched,
                pid: None,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.programs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SupervisedProgram> {
        self.programs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SupervisedProgram> {
        self.programs.iter_mut()
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut SupervisedProgram> {
        self.programs.get_mut(idx)
    }

    pub fn find_by_pid(&self, pid: i32) -> Option<&SupervisedProgram> {
        self.programs.iter().find(|p| p.pid == Some(pid))
    }

    pub fn position_by_pid(&self, pid: i32) -> Option<usize> {
        self.programs.iter().position(|p| p.pid == Some(pid))
    }

    /// Pids of everything currently believed to be running.
    pub fn running_pids(&self) -> Vec<i32> {
        self.programs.iter().filter_map(|p| p.pid).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(toml_str: &str) -> ConfigFile {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn load_builds_ordered_roster() {
        let mut registry = ProgramRegistry::new();
        registry.load(&cfg(
            r#"
            [[program]]
            path = "/bin/true"

            [[program]]
            path = "/bin/sleep"
            args = ["1000"]
            watched = false
            "#,
        ));

        assert_eq!(registry.len(), 2);
        let progs: Vec<_> = registry.iter().collect();
        assert_eq!(progs[0].path, PathBuf::from("/bin/true"));
        assert!(progs[0].watched);
        assert_eq!(progs[0].pid, None);
        assert_eq!(progs[1].args, vec!["1000".to_string()]);
        assert!(!progs[1].watched);
    }

    #[test]
    fn load_clears_previous_state() {
        let mut registry = ProgramRegistry::new();
        registry.load(&cfg("[[program]]\npath = \"/bin/true\"\n"));
        registry.iter_mut().next().unwrap().pid = Some(123);

        registry.load(&cfg("[[program]]\npath = \"/bin/false\"\n"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.iter().next().unwrap().pid, None);
        assert_eq!(registry.iter().next().unwrap().path, PathBuf::from("/bin/false"));
    }

    #[test]
    fn pid_lookup_finds_running_program() {
        let mut registry = ProgramRegistry::new();
        registry.load(&cfg("[[program]]\npath = \"/bin/true\"\n"));
        registry.iter_mut().next().unwrap().pid = Some(77);

        assert!(registry.find_by_pid(77).is_some());
        assert!(registry.find_by_pid(78).is_none());
        assert_eq!(registry.running_pids(), vec![77]);
    }
}
