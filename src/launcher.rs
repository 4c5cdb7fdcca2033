// src/launcher.rs

//! Process launching, signalling and reaping.
//!
//! The supervisor talks to a [`Launcher`] instead of the OS directly. This
//! makes it possible to drive the whole state machine with a fake launcher in
//! tests while keeping the production implementation in [`OsLauncher`].

use std::os::fd::RawFd;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::debug;

use crate::errors::{Result, SupervisorError};
use crate::heartbeat::HEARTBEAT_FD_ENV;

/// How hard to ask a process to go away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// SIGTERM: orderly shutdown request.
    Graceful,
    /// SIGKILL: for hung processes that stopped heartbeating.
    Forced,
}

/// Tagged exit status of a reaped child.
///
/// Kept tagged on purpose: a normal exit code and a terminating signal
/// number are different facts and must not be folded into one integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitKind {
    NormalExit(i32),
    KilledBySignal(i32),
}

/// One reaped process-exit notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitEvent {
    pub pid: i32,
    pub status: ExitKind,
}

/// Capability seam over spawn / kill / reap.
pub trait Launcher {
    /// Start `path` with `args` without waiting for it; returns the new pid.
    fn launch(&mut self, path: &Path, args: &[String]) -> Result<i32>;

    /// Request termination of `pid`. Returns whether the signal was
    /// delivered, not whether the process has exited. Signalling an
    /// already-gone pid is an expected failure, never a crash.
    fn kill(&mut self, pid: i32, how: Escalation) -> bool;

    /// Non-blocking: one process that exited since the last call, or `None`.
    /// Call repeatedly until `None` to avoid leaving zombies behind.
    fn reap_exited(&mut self) -> Option<ExitEvent>;

    /// Drain any pending exits, discarding them; returns true when no child
    /// processes remain at all.
    fn reap_all(&mut self) -> bool;
}

/// Production launcher: real OS processes.
///
/// Spawning goes through `std::process::Command` rather than tokio's process
/// support, because the supervisor reaps through `waitpid(-1)` and must be
/// the only thing in the process consuming child exit statuses.
#[derive(Debug)]
pub struct OsLauncher {
    heartbeat_fd: Option<RawFd>,
}

impl OsLauncher {
    /// `heartbeat_fd` is the inheritable write end of the heartbeat pipe; it
    /// is advertised to every child via [`HEARTBEAT_FD_ENV`].
    pub fn new(heartbeat_fd: Option<RawFd>) -> Self {
        Self { heartbeat_fd }
    }
}

impl Launcher for OsLauncher {
    fn launch(&mut self, path: &Path, args: &[String]) -> Result<i32> {
        let mut cmd = Command::new(path);
        cmd.args(args).stdin(Stdio::null());

        if let Some(fd) = self.heartbeat_fd {
            cmd.env(HEARTBEAT_FD_ENV, fd.to_string());
        }

        let child = cmd.spawn().map_err(|source| SupervisorError::Launch {
            path: path.to_path_buf(),
            source,
        })?;

        // The `Child` handle is dropped here; exit statuses are collected
        // centrally via `reap_exited`, not per-handle.
        Ok(child.id() as i32)
    }

    fn kill(&mut self, pid: i32, how: Escalation) -> bool {
        let sig = match how {
            Escalation::Graceful => Signal::SIGTERM,
            Escalation::Forced => Signal::SIGKILL,
        };
        match signal::kill(Pid::from_raw(pid), sig) {
            Ok(()) => true,
            Err(errno) => {
                debug!(pid, signal = %sig, %errno, "signal delivery failed");
                false
            }
        }
    }

    fn reap_exited(&mut self) -> Option<ExitEvent> {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(pid, code)) => Some(ExitEvent {
                pid: pid.as_raw(),
                status: ExitKind::NormalExit(code),
            }),
            Ok(WaitStatus::Signaled(pid, sig, _core)) => Some(ExitEvent {
                pid: pid.as_raw(),
                status: ExitKind::KilledBySignal(sig as i32),
            }),
            // StillAlive, stop/continue notifications: nothing to reap.
            Ok(_) => None,
            Err(Errno::ECHILD) => None,
            Err(errno) => {
                debug!(%errno, "waitpid failed");
                None
            }
        }
    }

    fn reap_all(&mut self) -> bool {
        loop {
            match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
                Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => continue,
                Ok(_) => return false,
                Err(Errno::ECHILD) => return true,
                Err(errno) => {
                    debug!(%errno, "waitpid failed");
                    return false;
                }
            }
        }
    }
}
