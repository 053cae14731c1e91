// src/config/validate.rs

use std::collections::BTreeMap;

use crate::config::model::RawConfigFile;
use crate::errors::{Result, RunError};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - there is at least one step
/// - every step has a non-empty `cmd`
/// - placeholders are unique across the whole file
/// - no background step declares a placeholder (its captures are always
///   empty, so later steps would silently receive nothing)
///
/// Durations and sink strings are checked while resolving steps.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_steps(cfg)?;
    validate_commands(cfg)?;
    validate_placeholders(cfg)?;
    Ok(())
}

fn ensure_has_steps(cfg: &RawConfigFile) -> Result<()> {
    if cfg.step.is_empty() {
        return Err(RunError::ConfigError(
            "config must contain at least one [[step]] table".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawConfigFile) -> Result<()> {
    for (idx, step) in cfg.step.iter().enumerate() {
        if step.cmd.trim().is_empty() {
            return Err(RunError::ConfigError(format!(
                "step #{} has an empty `cmd`",
                idx + 1
            )));
        }
    }
    Ok(())
}

fn validate_placeholders(cfg: &RawConfigFile) -> Result<()> {
    let mut seen: BTreeMap<&str, &str> = BTreeMap::new();

    for step in cfg.step.iter() {
        let name = step.display_name();
        let tokens = [step.out_token(), step.err_token()];

        if tokens.iter().any(Option::is_some) && !step.effective_foreground(&cfg.defaults) {
            return Err(RunError::ConfigError(format!(
                "step '{name}' runs in the background and cannot capture output into a placeholder"
            )));
        }

        for token in tokens.into_iter().flatten() {
            if let Some(previous) = seen.insert(token, name) {
                return Err(RunError::ConfigError(format!(
                    "placeholder '{token}' is declared by both '{previous}' and '{name}'"
                )));
            }
        }
    }

    Ok(())
}
