// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running a script through the
//! toolchain using `tokio::process::Command` and relaying what it prints.
//!
//! - [`supervisor`] owns the single in-flight execution: start, cancel,
//!   shutdown, and the exit-wait task that reports the result.
//! - `drain` contains the output pumps and the drain loop.
//! - [`process`] holds the OS-facing helpers (script file, command line,
//!   forced kill).
//! - [`outcome`] classifies exit statuses.

mod drain;
pub mod outcome;
pub mod process;
pub mod supervisor;

pub use outcome::{ExecutionOutcome, RunState};
pub use supervisor::{ExecutionHandle, Supervisor};
