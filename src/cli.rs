// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `procwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "procwatch",
    version,
    about = "Supervise a fixed roster of programs, restarting ones that die or stop heartbeating.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the roster config file (TOML).
    ///
    /// Default: `Procwatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Procwatch.toml")]
    pub config: String,

    /// Detach from the controlling terminal and run as a background service.
    ///
    /// Note: stdio is closed after detaching, so log output is lost unless
    /// redirected beforehand.
    #[arg(long)]
    pub daemon: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `PROCWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the roster, but don't launch anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
