// src/daemon.rs

//! Becoming a background service.
//!
//! Detaching must happen before the tokio runtime is built (forking a
//! process that already has runtime threads is unsound), so `main` calls
//! this while still synchronous.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static DAEMONIZED: AtomicBool = AtomicBool::new(false);

/// Detach from the controlling terminal and keep running in the background.
///
/// Idempotent: a second call is a no-op. The working directory is kept
/// (children are launched with roster-relative paths as given); stdio is
/// closed, matching `daemon(1, 0)` in the classic libc interface.
pub fn daemonize() -> io::Result<()> {
    if DAEMONIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    nix::unistd::daemon(true, false).map_err(io::Error::from)
}
