// src/config/validate.rs

use crate::config::model::{RawConfigFile, RunnerConfig};
use crate::errors::{Result, RunnerError};

impl TryFrom<RawConfigFile> for RunnerConfig {
    type Error = crate::errors::RunnerError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(RunnerConfig::new_unchecked(raw.toolchain, raw.runner))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_toolchain(cfg)?;
    validate_runner(cfg)?;
    Ok(())
}

fn validate_toolchain(cfg: &RawConfigFile) -> Result<()> {
    let toolchain = &cfg.toolchain;

    if toolchain.program.trim().is_empty() {
        return Err(RunnerError::ConfigError(
            "[toolchain].program must not be empty".to_string(),
        ));
    }

    if toolchain.script_flag.trim().is_empty() {
        return Err(RunnerError::ConfigError(
            "[toolchain].script_flag must not be empty".to_string(),
        ));
    }

    let ext = &toolchain.script_extension;
    if ext.is_empty() || ext.starts_with('.') {
        return Err(RunnerError::ConfigError(format!(
            "[toolchain].script_extension must be non-empty and without a leading dot (got {ext:?})"
        )));
    }

    Ok(())
}

fn validate_runner(cfg: &RawConfigFile) -> Result<()> {
    if cfg.runner.killed_exit_code == 0 {
        return Err(RunnerError::ConfigError(
            "[runner].killed_exit_code must not be 0 (0 means success)".to_string(),
        ));
    }
    Ok(())
}
