// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::Result;

/// Load a configuration file from a given path without validating it.
///
/// This only performs TOML deserialization; use [`load_and_validate`] for
/// the semantic checks as well.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: ConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run basic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for an empty roster, empty paths, and zero-valued timings.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn loads_roster_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [[program]]
            path = "/bin/true"
            "#
        )
        .unwrap();

        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg.program.len(), 1);
        assert_eq!(cfg.program[0].path, "/bin/true");
        assert!(cfg.program[0].args.is_empty());
        assert!(cfg.program[0].watched);
        assert_eq!(cfg.supervisor.inspect_period_secs, 3);
        assert_eq!(cfg.supervisor.stale_after_secs, 60);
        assert_eq!(cfg.supervisor.terminate_budget_secs, 120);
        assert_eq!(cfg.supervisor.reap_budget_secs, 180);
        assert_eq!(cfg.supervisor.startup_poll_ms, 100);
        assert_eq!(cfg.supervisor.max_tokens_per_tick, 1000);
    }

    #[test]
    fn supervisor_section_overrides_apply() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
            [supervisor]
            inspect_period_secs = 1
            stale_after_secs = 5
            terminate_budget_secs = 2

            [[program]]
            path = "/bin/sleep"
            args = ["1000"]
            watched = false
            "#
        )
        .unwrap();

        let cfg = load_and_validate(file.path()).unwrap();
        assert_eq!(cfg.supervisor.inspect_period_secs, 1);
        assert_eq!(cfg.supervisor.stale_after_secs, 5);
        assert_eq!(cfg.supervisor.terminate_budget_secs, 2);
        assert_eq!(cfg.program[0].args, vec!["1000".to_string()]);
        assert!(!cfg.program[0].watched);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_and_validate("/nonexistent/Procwatch.toml").is_err());
    }
}
