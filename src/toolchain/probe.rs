// src/toolchain/probe.rs

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::config::ToolchainConfig;

/// Availability check and warm-up for the external toolchain.
pub trait ToolchainProbe: Send + Sync {
    /// Whether the toolchain executable can be located. Never fails; any
    /// lookup problem counts as "not available".
    fn is_available(&self) -> bool;

    /// Fire-and-forget invocation of the version probe to prime OS caches.
    ///
    /// Failures are logged, never surfaced, never retried.
    fn warm(&self);
}

/// Probe backed by a PATH lookup (`which` on Unix, `where` semantics on
/// Windows, via the `which` crate).
#[derive(Debug, Clone)]
pub struct SystemProbe {
    program: String,
    version_flag: String,
    runtime: Handle,
}

impl SystemProbe {
    pub fn new(toolchain: &ToolchainConfig, runtime: Handle) -> Self {
        Self {
            program: toolchain.program.clone(),
            version_flag: toolchain.version_flag.clone(),
            runtime,
        }
    }

    /// Resolve the program to a full path, if present.
    pub fn locate(&self) -> Option<PathBuf> {
        match which::which(&self.program) {
            Ok(path) => {
                debug!(program = %self.program, path = ?path, "toolchain located");
                Some(path)
            }
            Err(e) => {
                debug!(program = %self.program, error = %e, "toolchain lookup failed");
                None
            }
        }
    }
}

impl ToolchainProbe for SystemProbe {
    fn is_available(&self) -> bool {
        self.locate().is_some()
    }

    fn warm(&self) {
        let program = self.program.clone();
        let flag = self.version_flag.clone();

        self.runtime.spawn(async move {
            let status = Command::new(&program)
                .arg(&flag)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;

            match status {
                Ok(status) => info!(program = %program, ?status, "toolchain preloaded"),
                Err(e) => warn!(program = %program, error = %e, "error preloading toolchain"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_for(program: &str) -> SystemProbe {
        let toolchain = ToolchainConfig {
            program: program.to_string(),
            ..ToolchainConfig::default()
        };
        SystemProbe::new(&toolchain, Handle::current())
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let probe = probe_for("scriptrun-definitely-not-a-real-compiler");
        assert!(!probe.is_available());
        assert!(probe.locate().is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_is_available() {
        let probe = probe_for("sh");
        assert!(probe.is_available());
    }

    #[tokio::test]
    async fn warming_a_missing_program_does_not_panic() {
        let probe = probe_for("scriptrun-definitely-not-a-real-compiler");
        probe.warm();
        tokio::task::yield_now().await;
    }
}
