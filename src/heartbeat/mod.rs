// src/heartbeat/mod.rs

//! Liveness signaling from supervised processes to the supervisor.
//!
//! A heartbeat is one fixed-width signed integer per token: a positive value
//! is an "alive" ping for that pid, a negative value deregisters `abs(v)`
//! from observation. The primary carrier is a non-blocking unix pipe
//! ([`pipe`]); the supervisor itself only depends on the [`HeartbeatSource`]
//! trait, so alternative carriers (see [`crate::netbeat`]) and test fakes
//! plug in the same way.

pub mod pipe;
pub mod token;

use std::io;

pub use pipe::{HeartbeatChannel, HeartbeatSender, HEARTBEAT_FD_ENV};
pub use token::{HeartbeatToken, TokenKind};

/// One-reader view of a heartbeat carrier.
///
/// `try_recv` never blocks. A transport-level read failure is reported as an
/// error exactly once per occurrence; the supervisor treats it as a signal to
/// degrade to exit-notification-only tracking, not as a crash.
pub trait HeartbeatSource {
    fn try_recv(&mut self) -> io::Result<Option<HeartbeatToken>>;
}
