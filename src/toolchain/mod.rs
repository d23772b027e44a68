// src/toolchain/mod.rs

//! Toolchain discovery and warm-up.
//!
//! The runner asks a [`ToolchainProbe`] before every run whether the
//! compiler is reachable. [`SystemProbe`] is the production implementation;
//! tests may substitute their own.

pub mod probe;

pub use probe::{SystemProbe, ToolchainProbe};
