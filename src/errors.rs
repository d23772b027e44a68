// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A second run was requested while one is still in flight.
    #[error("an execution is already in flight")]
    AlreadyRunning,

    /// Writing the script file or spawning the toolchain failed.
    #[error("failed to start process: {0}")]
    ProcessStart(String),

    #[error("runner has been shut down")]
    ShutDown,
}

pub type Result<T> = std::result::Result<T, RunnerError>;
