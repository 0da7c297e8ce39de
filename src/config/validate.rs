// src/config/validate.rs

use crate::config::model::RawConfigFile;
use crate::errors::{PlaylogError, Result};

/// Run basic semantic validation against a loaded configuration.
///
/// This checks:
/// - `[logging].logs_root` is not empty
/// - `[logging].max_size_bytes >= 1`
/// - `[logging].rate_limit >= 1` and `rate_window_secs >= 1`
/// - `[run].forks >= 1`
/// - `[engine].command` is not empty
///
/// It does **not** check that the engine command exists; that surfaces as a
/// run start failure.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_logging(cfg)?;
    validate_run(cfg)?;
    validate_engine(cfg)?;
    Ok(())
}

fn validate_logging(cfg: &RawConfigFile) -> Result<()> {
    let logging = &cfg.logging;

    if logging.logs_root.trim().is_empty() {
        return Err(PlaylogError::ConfigError(
            "[logging].logs_root must not be empty".to_string(),
        ));
    }
    if logging.max_size_bytes == 0 {
        return Err(PlaylogError::ConfigError(
            "[logging].max_size_bytes must be >= 1 (got 0)".to_string(),
        ));
    }
    if logging.rate_limit == 0 {
        return Err(PlaylogError::ConfigError(
            "[logging].rate_limit must be >= 1 (got 0)".to_string(),
        ));
    }
    if logging.rate_window_secs == 0 {
        return Err(PlaylogError::ConfigError(
            "[logging].rate_window_secs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_run(cfg: &RawConfigFile) -> Result<()> {
    if cfg.run.forks == 0 {
        return Err(PlaylogError::ConfigError(
            "[run].forks must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_engine(cfg: &RawConfigFile) -> Result<()> {
    if cfg.engine.command.trim().is_empty() {
        return Err(PlaylogError::ConfigError(
            "[engine].command must not be empty".to_string(),
        ));
    }
    Ok(())
}
