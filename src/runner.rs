// src/runner.rs

//! Execution coordinator.
//!
//! `ScriptRunner::run` walks through, in order:
//! 1. shut-down and single-flight checks (a request while busy, or after
//!    `shutdown`, is silently ignored),
//! 2. clearing annotations from the previous run,
//! 3. toolchain availability,
//! 4. blank-script check,
//! 5. cache lookup (a hit never starts a process),
//! 6. handing the script to the [`Supervisor`].
//!
//! Results are communicated through the [`Presenter`]; the returned
//! [`RunDisposition`] only says which path was taken.

use std::sync::Arc;

use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use crate::cache::{ResultCache, ScriptHash};
use crate::config::RunnerConfig;
use crate::errors::RunnerError;
use crate::exec::{ExecutionHandle, RunState, Supervisor};
use crate::toolchain::{SystemProbe, ToolchainProbe};
use crate::ui::{Presenter, RunStatus};

/// Which path a `run` request took.
#[derive(Debug)]
pub enum RunDisposition {
    /// Another execution is in flight, or the runner was shut down.
    Rejected,
    ToolchainMissing,
    /// Nothing to run.
    Blank,
    FromCache,
    /// The process could not be started; an `Error` status was reported.
    StartFailed(String),
    Started(ExecutionHandle),
}

pub struct ScriptRunner {
    config: Arc<RunnerConfig>,
    probe: Arc<dyn ToolchainProbe>,
    cache: Arc<ResultCache>,
    supervisor: Supervisor,
    presenter: Presenter,
}

impl ScriptRunner {
    /// Runner using a PATH lookup for the configured toolchain.
    pub fn new(config: RunnerConfig, presenter: Presenter, runtime: Handle) -> Self {
        let probe = Arc::new(SystemProbe::new(&config.toolchain, runtime.clone()));
        Self::with_probe(config, presenter, runtime, probe)
    }

    pub fn with_probe(
        config: RunnerConfig,
        presenter: Presenter,
        runtime: Handle,
        probe: Arc<dyn ToolchainProbe>,
    ) -> Self {
        let config = Arc::new(config);
        let cache = Arc::new(ResultCache::new());
        let supervisor = Supervisor::new(
            Arc::clone(&config),
            Arc::clone(&cache),
            presenter.clone(),
            runtime,
        );
        Self {
            config,
            probe,
            cache,
            supervisor,
            presenter,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResultCache {
        &self.cache
    }

    pub fn state(&self) -> RunState {
        self.supervisor.state()
    }

    /// Warm the toolchain in the background.
    pub fn preload(&self) {
        self.probe.warm();
    }

    /// Run `script`. Returns as soon as the process has been launched.
    pub fn run(&self, script: &str, use_cache: bool) -> RunDisposition {
        if self.supervisor.is_shut_down() {
            debug!("runner is shut down; ignoring run request");
            return RunDisposition::Rejected;
        }
        if !self.supervisor.is_idle() {
            debug!("run requested while an execution is in flight; ignoring");
            return RunDisposition::Rejected;
        }

        self.presenter.clear_annotations();

        if !self.probe.is_available() {
            warn!(program = %self.config.toolchain.program, "toolchain not found on PATH");
            self.presenter.report_status(RunStatus::ToolchainMissing {
                program: self.config.toolchain.program.clone(),
            });
            return RunDisposition::ToolchainMissing;
        }

        if script.trim().is_empty() {
            debug!("script is blank; nothing to run");
            return RunDisposition::Blank;
        }

        let hash = ScriptHash::of(script);

        if use_cache {
            if let Some(cached) = self.cache.lookup(&hash).filter(|text| !text.is_empty()) {
                info!(hash = %hash.short(), "serving run from result cache");
                self.presenter.report_status(RunStatus::FromCache);
                self.presenter.render(cached);
                return RunDisposition::FromCache;
            }
        }

        match self.supervisor.start(script, hash) {
            Ok(handle) => RunDisposition::Started(handle),
            Err(RunnerError::AlreadyRunning) => {
                debug!("lost the race for the execution slot; ignoring");
                RunDisposition::Rejected
            }
            Err(RunnerError::ShutDown) => {
                debug!("runner is shut down; ignoring run request");
                RunDisposition::Rejected
            }
            Err(e) => {
                let message = e.to_string();
                self.presenter.report_status(RunStatus::Error {
                    message: message.clone(),
                });
                RunDisposition::StartFailed(message)
            }
        }
    }

    /// Run whatever the editor currently holds.
    pub fn run_editor(&self, use_cache: bool) -> RunDisposition {
        let script = self.presenter.editor_text();
        self.run(&script, use_cache)
    }

    /// Forcibly end the in-flight execution; a no-op when idle.
    pub async fn stop(&self) -> bool {
        self.supervisor.cancel().await
    }

    pub async fn wait_idle(&self) {
        self.supervisor.wait_idle().await;
    }

    /// Cancel anything in flight. No further runs are accepted.
    pub async fn shutdown(&self) {
        self.supervisor.shutdown().await;
    }
}
