// src/config/validate.rs

use crate::config::model::ConfigFile;
use crate::errors::{Result, SupervisorError};

/// Semantic validation on top of deserialization.
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    ensure_has_programs(cfg)?;
    validate_programs(cfg)?;
    validate_timings(cfg)?;
    Ok(())
}

fn ensure_has_programs(cfg: &ConfigFile) -> Result<()> {
    if cfg.program.is_empty() {
        return Err(SupervisorError::ConfigError(
            "config must contain at least one [[program]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_programs(cfg: &ConfigFile) -> Result<()> {
    for (i, prog) in cfg.program.iter().enumerate() {
        if prog.path.trim().is_empty() {
            return Err(SupervisorError::ConfigError(format!(
                "program #{i} has an empty `path`"
            )));
        }
    }
    Ok(())
}

fn validate_timings(cfg: &ConfigFile) -> Result<()> {
    let s = &cfg.supervisor;
    if s.inspect_period_secs == 0 {
        return Err(SupervisorError::ConfigError(
            "[supervisor].inspect_period_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if s.stale_after_secs == 0 {
        return Err(SupervisorError::ConfigError(
            "[supervisor].stale_after_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    if s.startup_poll_ms == 0 {
        return Err(SupervisorError::ConfigError(
            "[supervisor].startup_poll_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if s.max_tokens_per_tick == 0 {
        return Err(SupervisorError::ConfigError(
            "[supervisor].max_tokens_per_tick must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
