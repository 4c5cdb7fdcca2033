// src/errors.rs

//! Crate-wide error types.
//!
//! The supervisor loop is the single place that decides which of these are
//! fatal; components only report typed outcomes.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Heartbeat channel could not be created. Fatal at startup: without a
    /// liveness conduit there is nothing to supervise with.
    #[error("failed to create heartbeat channel: {0}")]
    ChannelCreate(#[source] std::io::Error),

    #[error("failed to become a background service: {0}")]
    Daemonize(#[source] std::io::Error),

    /// A program could not be launched (binary missing, permissions, ...).
    #[error("failed to launch program '{path}': {source}")]
    Launch {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A restart attempt during monitoring failed. Fatal at runtime: the
    /// supervisor does not keep watching a roster it cannot keep alive.
    #[error("failed to restart program '{path}' (previous pid {pid}): {source}")]
    Restart {
        path: PathBuf,
        pid: i32,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
