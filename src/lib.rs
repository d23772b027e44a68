// src/lib.rs

pub mod annotate;
pub mod cache;
pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod runner;
pub mod toolchain;
pub mod ui;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::runtime::Handle;
use tracing::{info, warn};

use crate::cli::CliArgs;
use crate::config::load_or_default;
use crate::exec::ExecutionOutcome;
use crate::runner::{RunDisposition, ScriptRunner};
use crate::ui::console::{ConsoleEditor, ConsoleOutput, ConsoleStatus, spawn_ui_thread};
use crate::ui::{Presenter, RunStatus};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (plus CLI overrides)
/// - the console presentation and its UI thread
/// - the script runner
/// - Ctrl-C handling
///
/// Returns the process exit code to use.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut config = load_or_default(&args.config)
        .with_context(|| format!("loading config from {:?}", args.config))?;

    if let Some(program) = args.toolchain.as_deref() {
        if program.trim().is_empty() {
            bail!("--toolchain must not be empty");
        }
        config.toolchain.program = program.to_string();
    }

    let script = read_script(&args.script)?;
    let use_cache = config.runner.use_cache && !args.no_cache;
    let killed_exit_code = config.runner.killed_exit_code;
    let preload = config.runner.preload;

    let (dispatcher, ui_thread) = spawn_ui_thread().context("starting UI thread")?;
    let presenter = Presenter::new(
        Arc::new(dispatcher),
        Arc::new(ConsoleOutput::new()),
        Arc::new(ConsoleStatus),
        Arc::new(ConsoleEditor::new(script)),
    );
    presenter.report_status(RunStatus::Ready);

    let runner = Arc::new(ScriptRunner::new(config, presenter, Handle::current()));
    if preload {
        runner.preload();
    }

    // Ctrl-C → forced stop of the current execution.
    let interrupt = {
        let runner = Arc::clone(&runner);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("interrupt received; stopping execution");
            runner.stop().await;
        })
    };

    let mut exit_code = 0;
    for iteration in 1..=args.repeat.max(1) {
        info!(iteration, use_cache, "running script");
        let (code, killed) = match runner.run_editor(use_cache) {
            RunDisposition::Started(handle) => match handle.wait().await {
                ExecutionOutcome::Completed { code, .. } => (code, false),
                ExecutionOutcome::Killed => (killed_exit_code, true),
                ExecutionOutcome::Error { .. } => (1, false),
            },
            RunDisposition::FromCache | RunDisposition::Blank => (0, false),
            RunDisposition::ToolchainMissing
            | RunDisposition::StartFailed(_)
            | RunDisposition::Rejected => (1, false),
        };
        exit_code = code;
        if killed {
            break;
        }
    }

    interrupt.abort();
    let _ = interrupt.await;
    runner.shutdown().await;
    drop(runner);

    // Flush whatever the UI thread still has queued.
    tokio::task::spawn_blocking(move || ui_thread.join())
        .await
        .context("joining UI thread")?
        .map_err(|_| anyhow::anyhow!("UI thread panicked"))?;

    Ok(exit_code)
}

fn read_script(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut script = String::new();
        std::io::stdin()
            .read_to_string(&mut script)
            .context("reading script from stdin")?;
        return Ok(script);
    }
    std::fs::read_to_string(path).with_context(|| format!("reading script {:?}", path))
}
