// src/logging.rs

//! Logging setup for `procwatch` using `tracing` + `tracing-subscriber`.
//!
//! The effective filter is chosen in this order:
//! 1. `--log-level` CLI flag (a plain level)
//! 2. `PROCWATCH_LOG` environment variable (full `EnvFilter` syntax, so
//!    per-module directives like `procwatch::supervisor=debug` work)
//! 3. default `info`
//!
//! Logs go to stderr. In foreground mode that keeps stdout clean (the
//! `--dry-run` roster print uses it); after daemonization stdio is closed
//! and output is lost either way.

use anyhow::Result;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::LogLevel;

const LOG_ENV: &str = "PROCWATCH_LOG";

/// Initialise the global logging subscriber. Call once, from `main`.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(level_str(lvl)),
        None => EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    Ok(())
}

fn level_str(lvl: LogLevel) -> &'static str {
    match lvl {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
