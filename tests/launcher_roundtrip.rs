// tests/launcher_roundtrip.rs

//! `OsLauncher` against real processes.
//!
//! Everything that reaps lives in a single test function: `waitpid(-1)`
//! consumes exit statuses process-wide, so two tests reaping in parallel
//! would steal each other's notifications.

use std::path::Path;
use std::time::{Duration, Instant};

use procwatch::errors::SupervisorError;
use procwatch::launcher::{Escalation, ExitEvent, ExitKind, Launcher, OsLauncher};
use procwatch_test_utils::init_tracing;

/// Poll for the next exit notification, with a deadline so a broken reap
/// fails the test instead of hanging it.
fn wait_for_exit(launcher: &mut OsLauncher) -> ExitEvent {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        if let Some(event) = launcher.reap_exited() {
            return event;
        }
        assert!(Instant::now() < deadline, "no exit notification within 10s");
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn launch_kill_and_reap_real_processes() {
    init_tracing();
    let mut launcher = OsLauncher::new(None);

    // A short-lived child exits on its own and is reaped exactly once.
    let pid = launcher.launch(Path::new("/bin/true"), &[]).unwrap();
    assert!(pid > 0);
    let event = wait_for_exit(&mut launcher);
    assert_eq!(event.pid, pid);
    assert_eq!(event.status, ExitKind::NormalExit(0));

    // A long-lived child is killed forcibly and reports the signal.
    let pid = launcher
        .launch(Path::new("/bin/sleep"), &["1000".to_string()])
        .unwrap();
    assert!(launcher.kill(pid, Escalation::Forced));
    let event = wait_for_exit(&mut launcher);
    assert_eq!(event.pid, pid);
    assert_eq!(event.status, ExitKind::KilledBySignal(9));

    // No children left: nothing to reap, and reap_all agrees.
    assert!(launcher.reap_exited().is_none());
    assert!(launcher.reap_all());
}

#[test]
fn kill_of_nonexistent_pid_reports_undelivered() {
    init_tracing();
    let mut launcher = OsLauncher::new(None);
    // Far above any plausible pid_max.
    assert!(!launcher.kill(0x3fff_fffe, Escalation::Graceful));
}

#[test]
fn launch_of_missing_binary_fails_with_path() {
    init_tracing();
    let mut launcher = OsLauncher::new(None);
    let err = launcher
        .launch(Path::new("/nonexistent/never-here"), &[])
        .unwrap_err();
    match err {
        SupervisorError::Launch { path, .. } => {
            assert_eq!(path, Path::new("/nonexistent/never-here"));
        }
        other => panic!("unexpected error: {other}"),
    }
}
