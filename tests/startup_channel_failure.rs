// tests/startup_channel_failure.rs

//! Startup when the heartbeat pipe cannot be created: the failure is the
//! fatal `ChannelCreate` class and no program is ever launched.
//!
//! Kept alone in this file: the fd rlimit is process-wide, so nothing else
//! may allocate fds while it is lowered.

use nix::sys::resource::{getrlimit, setrlimit, Resource};
use procwatch::errors::SupervisorError;
use procwatch::heartbeat::HeartbeatChannel;
use procwatch_test_utils::fakes::FakeLauncher;
use procwatch_test_utils::init_tracing;

#[test]
fn channel_creation_failure_is_fatal_before_any_launch() {
    init_tracing();
    let launcher = FakeLauncher::new();

    let (soft, hard) = getrlimit(Resource::RLIMIT_NOFILE).unwrap();
    setrlimit(Resource::RLIMIT_NOFILE, 0, hard).unwrap();
    // Same startup order as `main`: the channel comes first; the roster is
    // only launched once it exists.
    let result = HeartbeatChannel::create().map_err(SupervisorError::ChannelCreate);
    setrlimit(Resource::RLIMIT_NOFILE, soft, hard).unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err, SupervisorError::ChannelCreate(_)));
    assert!(err.to_string().contains("heartbeat channel"));
    assert!(launcher.launched().is_empty());
}
