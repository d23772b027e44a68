// src/exec/supervisor.rs

//! Process supervisor: owns the single in-flight execution.
//!
//! Per execution there are three logical tasks:
//! - the drain loop (`drain.rs`), relaying output to the presenter,
//! - the exit-wait task (`await_exit`), the only writer of terminal
//!   status and the only place the execution is torn down,
//! - transiently, a caller blocked in [`Supervisor::cancel`].
//!
//! They coordinate through:
//! - a `watch<bool>` cancel flag read by the drain loop,
//! - a one-shot kill request (carrying an ack sender) read by the exit-wait
//!   task,
//! - a one-shot drain-complete signal the exit-wait task awaits before it
//!   classifies the result, so all output is rendered before the status.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tempfile::NamedTempFile;
use tokio::process::Child;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

use crate::cache::{ResultCache, ScriptHash};
use crate::config::RunnerConfig;
use crate::errors::{Result, RunnerError};
use crate::exec::drain::{DrainReport, drain_output, spawn_pump};
use crate::exec::outcome::{ExecutionOutcome, RunState, classify};
use crate::exec::process::{SpawnedScript, force_kill, kill_group, spawn_script, write_script};
use crate::ui::{Presenter, RunStatus};

/// Sent by `cancel` to the exit-wait task; fired once the process is gone
/// and the execution has been torn down.
type KillAck = oneshot::Sender<()>;

enum KillRequest {
    Sent(oneshot::Receiver<()>),
    Nothing,
    NotYetStarted,
}

/// Handle to the live process, owned by the supervisor's lock.
struct ActiveExecution {
    id: u64,
    cancel: watch::Sender<bool>,
    /// Taken by the first `cancel`; later calls find `None`.
    kill: Option<oneshot::Sender<KillAck>>,
}

enum Phase {
    Idle,
    /// Slot reserved; the script file is being written / process spawned.
    Starting,
    Active(ActiveExecution),
}

impl Phase {
    fn run_state(&self) -> RunState {
        match self {
            Phase::Idle => RunState::Idle,
            Phase::Starting => RunState::Running,
            Phase::Active(active) if *active.cancel.borrow() => RunState::Stopping,
            Phase::Active(_) => RunState::Running,
        }
    }
}

struct Shared {
    phase: Mutex<Phase>,
    /// Mirror of `phase`, published on every transition so callers can
    /// await one.
    state: watch::Sender<RunState>,
    shut_down: AtomicBool,
    next_id: AtomicU64,
}

/// Everything the exit-wait task needs besides the child itself.
struct Launched {
    id: u64,
    pgid: Option<u32>,
    hash: ScriptHash,
    started_at: Instant,
    script_file: NamedTempFile,
    kill_rx: oneshot::Receiver<KillAck>,
    drain_rx: oneshot::Receiver<DrainReport>,
    outcome_tx: oneshot::Sender<ExecutionOutcome>,
}

/// Awaitable result of one execution.
#[derive(Debug)]
pub struct ExecutionHandle {
    id: u64,
    outcome: oneshot::Receiver<ExecutionOutcome>,
}

impl ExecutionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the execution to finish. The terminal status has already
    /// been dispatched to the presenter when this resolves.
    pub async fn wait(self) -> ExecutionOutcome {
        self.outcome.await.unwrap_or_else(|_| ExecutionOutcome::Error {
            message: "execution ended without reporting an outcome".to_string(),
        })
    }
}

/// Single-flight owner of the external process.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
    config: Arc<RunnerConfig>,
    cache: Arc<ResultCache>,
    presenter: Presenter,
    runtime: Handle,
}

impl Supervisor {
    pub fn new(
        config: Arc<RunnerConfig>,
        cache: Arc<ResultCache>,
        presenter: Presenter,
        runtime: Handle,
    ) -> Self {
        let (state, _) = watch::channel(RunState::Idle);
        Self {
            shared: Arc::new(Shared {
                phase: Mutex::new(Phase::Idle),
                state,
                shut_down: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
            }),
            config,
            cache,
            presenter,
            runtime,
        }
    }

    pub fn state(&self) -> RunState {
        self.lock_phase().run_state()
    }

    pub fn is_idle(&self) -> bool {
        self.state() == RunState::Idle
    }

    /// Whether `shutdown` has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shared.shut_down.load(Ordering::SeqCst)
    }

    /// Write `script` to a fresh file and launch the toolchain on it.
    ///
    /// Reports `Running` before any output can be relayed. On failure the
    /// supervisor is back to idle and no process is left behind.
    pub fn start(&self, script: &str, hash: ScriptHash) -> Result<ExecutionHandle> {
        self.reserve()?;
        self.launch(script, hash)
    }

    /// Second half of `start`, once the slot is reserved.
    fn launch(&self, script: &str, hash: ScriptHash) -> Result<ExecutionHandle> {
        let script_file = match write_script(
            script,
            self.config.runner.temp_dir.as_deref(),
            &self.config.toolchain.script_extension,
        ) {
            Ok(file) => file,
            Err(e) => return Err(self.abort_start(format!("writing script file: {e}"))),
        };

        let started_at = Instant::now();
        let spawned = {
            let _guard = self.runtime.enter();
            spawn_script(&self.config.toolchain, script_file.path())
        };
        let spawned = match spawned {
            Ok(spawned) => spawned,
            Err(e) => {
                return Err(self.abort_start(format!(
                    "starting `{}`: {e}",
                    self.config.toolchain.program
                )));
            }
        };

        Ok(self.supervise(spawned, hash, script_file, started_at))
    }

    /// Forcibly terminate the in-flight execution.
    ///
    /// Returns once the process is gone, `Killed` has been reported and the
    /// supervisor is idle. A cancel that arrives while the process is still
    /// being started waits for the launch to finish, then kills it. Returns
    /// `false` without doing anything when there is nothing to cancel, or
    /// another cancel is already under way.
    pub async fn cancel(&self) -> bool {
        let mut state = self.shared.state.subscribe();
        loop {
            match self.request_kill() {
                KillRequest::Sent(ack_rx) => return ack_rx.await.is_ok(),
                KillRequest::Nothing => return false,
                KillRequest::NotYetStarted => {
                    debug!("cancel requested while the process is starting; waiting");
                    if state.changed().await.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    fn request_kill(&self) -> KillRequest {
        let mut phase = self.lock_phase();
        let active = match &mut *phase {
            Phase::Idle => {
                debug!("cancel requested with no active process; ignoring");
                return KillRequest::Nothing;
            }
            Phase::Starting => return KillRequest::NotYetStarted,
            Phase::Active(active) => active,
        };
        let Some(kill) = active.kill.take() else {
            debug!(id = active.id, "cancel already in progress");
            return KillRequest::Nothing;
        };

        info!(id = active.id, "cancelling script execution");
        active.cancel.send_replace(true);
        self.shared.state.send_replace(RunState::Stopping);

        let (ack_tx, ack_rx) = oneshot::channel();
        if kill.send(ack_tx).is_err() {
            debug!(id = active.id, "exit-wait task already finished");
            return KillRequest::Nothing;
        }
        KillRequest::Sent(ack_rx)
    }

    /// Cancel anything in flight and refuse further starts.
    pub async fn shutdown(&self) {
        {
            let _phase = self.lock_phase();
            self.shared.shut_down.store(true, Ordering::SeqCst);
        }

        let mut state = self.shared.state.subscribe();
        loop {
            self.cancel().await;
            if *state.borrow_and_update() == RunState::Idle {
                break;
            }
            if state.changed().await.is_err() {
                break;
            }
        }

        info!("supervisor shut down");
    }

    /// Resolve once no execution is in flight.
    pub async fn wait_idle(&self) {
        let mut state = self.shared.state.subscribe();
        let _ = state.wait_for(|s| *s == RunState::Idle).await;
    }

    fn reserve(&self) -> Result<()> {
        let mut phase = self.lock_phase();
        if self.shared.shut_down.load(Ordering::SeqCst) {
            return Err(RunnerError::ShutDown);
        }
        if !matches!(*phase, Phase::Idle) {
            return Err(RunnerError::AlreadyRunning);
        }
        self.transition(&mut phase, Phase::Starting);
        Ok(())
    }

    fn abort_start(&self, message: String) -> RunnerError {
        warn!(error = %message, "failed to start script process");
        let mut phase = self.lock_phase();
        self.transition(&mut phase, Phase::Idle);
        RunnerError::ProcessStart(message)
    }

    fn supervise(
        &self,
        spawned: SpawnedScript,
        hash: ScriptHash,
        script_file: NamedTempFile,
        started_at: Instant,
    ) -> ExecutionHandle {
        let SpawnedScript {
            child,
            output,
            pgid,
        } = spawned;
        let id = self.shared.next_id.fetch_add(1, Ordering::SeqCst);
        info!(
            id,
            pid = ?pgid,
            program = %self.config.toolchain.program,
            hash = %hash.short(),
            "script process started"
        );

        self.presenter.report_status(RunStatus::Running);

        let (cancel_tx, cancel_rx) = watch::channel(false);
        let (kill_tx, kill_rx) = oneshot::channel::<KillAck>();
        let (drain_tx, drain_rx) = oneshot::channel::<DrainReport>();
        let (outcome_tx, outcome_rx) = oneshot::channel::<ExecutionOutcome>();

        let (chunk_tx, chunk_rx) = mpsc::channel::<String>(64);
        let pumps = vec![spawn_pump(&self.runtime, output, chunk_tx, "output")];

        let presenter = self.presenter.clone();
        let throttle = self.config.runner.drain_throttle();
        self.runtime.spawn(async move {
            let report = drain_output(chunk_rx, cancel_rx, presenter, throttle, pumps).await;
            let _ = drain_tx.send(report);
        });

        {
            let mut phase = self.lock_phase();
            self.transition(
                &mut phase,
                Phase::Active(ActiveExecution {
                    id,
                    cancel: cancel_tx,
                    kill: Some(kill_tx),
                }),
            );
        }

        let launched = Launched {
            id,
            pgid,
            hash,
            started_at,
            script_file,
            kill_rx,
            drain_rx,
            outcome_tx,
        };
        self.runtime.spawn(self.clone().await_exit(child, launched));

        ExecutionHandle {
            id,
            outcome: outcome_rx,
        }
    }

    /// Exit-wait task.
    async fn await_exit(self, mut child: Child, launched: Launched) {
        let Launched {
            id,
            pgid,
            hash,
            started_at,
            script_file,
            kill_rx,
            mut drain_rx,
            outcome_tx,
        } = launched;

        let mut kill_rx = Some(kill_rx);
        let mut acks = Vec::new();
        let mut killed_by_request = false;

        let status = tokio::select! {
            status = child.wait() => status,
            ack = next_kill_request(&mut kill_rx) => {
                acks.push(ack);
                killed_by_request = true;
                info!(id, "killing script process");
                force_kill(&mut child, pgid).await
            }
        };

        // Output first, status second. Processes left in the group can keep
        // the pipe open after the direct child exits, so a kill request is
        // still honoured while draining.
        let report = if killed_by_request {
            drain_rx.await
        } else {
            tokio::select! {
                report = &mut drain_rx => report,
                ack = next_kill_request(&mut kill_rx) => {
                    acks.push(ack);
                    killed_by_request = true;
                    info!(id, "killing processes left in the script's group");
                    kill_group(pgid);
                    drain_rx.await
                }
            }
        };
        let report = report.unwrap_or_default();
        let elapsed = started_at.elapsed().saturating_sub(report.throttled);

        let outcome = match status {
            Ok(status) => classify(
                status,
                killed_by_request,
                self.config.runner.killed_exit_code,
                elapsed,
            ),
            Err(e) => ExecutionOutcome::Error {
                message: format!("waiting for script process: {e}"),
            },
        };

        info!(id, ?outcome, elapsed_ms = elapsed.as_millis() as u64, "script process exited");

        if outcome.is_success() && report.reached_eof {
            self.cache.store(hash, report.output);
        }

        self.presenter.report_status(outcome.clone().into());

        if let Err(e) = script_file.close() {
            debug!(id, error = %e, "could not remove script file");
        }

        {
            let mut phase = self.lock_phase();
            if matches!(&*phase, Phase::Active(active) if active.id == id) {
                self.transition(&mut phase, Phase::Idle);
            }
        }

        // A cancel that raced with the end of the drain is still waiting.
        if let Some(rx) = kill_rx.as_mut() {
            if let Ok(ack) = rx.try_recv() {
                acks.push(ack);
            }
        }

        let _ = outcome_tx.send(outcome);
        for ack in acks {
            let _ = ack.send(());
        }
    }

    fn transition(&self, phase: &mut Phase, next: Phase) {
        *phase = next;
        self.shared.state.send_replace(phase.run_state());
    }

    fn lock_phase(&self) -> MutexGuard<'_, Phase> {
        self.shared
            .phase
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resolve with the ack sender of the next kill request. Pends forever once
/// the request channel is used up or closed.
async fn next_kill_request(rx: &mut Option<oneshot::Receiver<KillAck>>) -> KillAck {
    if let Some(pending) = rx.as_mut() {
        let request = pending.await;
        *rx = None;
        if let Ok(ack) = request {
            return ack;
        }
    }
    std::future::pending().await
}

#[cfg(all(test, unix))]
mod tests {
    use std::path::Path;
    use std::time::Duration;

    use super::*;
    use crate::ui::InlineDispatcher;
    use crate::ui::memory::{MemoryEditor, MemoryOutput, RecordingStatus};

    fn shell_supervisor(status: Arc<RecordingStatus>, dir: &Path) -> Supervisor {
        let mut config = RunnerConfig::default();
        config.toolchain.program = "sh".to_string();
        config.toolchain.script_flag = "-e".to_string();
        config.runner.temp_dir = Some(dir.to_path_buf());

        let presenter = Presenter::new(
            Arc::new(InlineDispatcher),
            Arc::new(MemoryOutput::new()),
            status,
            Arc::new(MemoryEditor::new("")),
        );
        Supervisor::new(
            Arc::new(config),
            Arc::new(ResultCache::new()),
            presenter,
            Handle::current(),
        )
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_while_starting_kills_the_launched_process() {
        let dir = tempfile::tempdir().unwrap();
        let status = Arc::new(RecordingStatus::new());
        let supervisor = shell_supervisor(status.clone(), dir.path());

        supervisor.reserve().unwrap();
        let canceller = tokio::spawn({
            let supervisor = supervisor.clone();
            async move { supervisor.cancel().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!canceller.is_finished(), "cancel must wait for the launch");

        let handle = supervisor
            .launch("sleep 30", ScriptHash::of("sleep 30"))
            .unwrap();

        let cancelled = tokio::time::timeout(Duration::from_secs(5), canceller)
            .await
            .expect("cancel should finish once the process is killed")
            .unwrap();
        assert!(cancelled);
        assert_eq!(handle.wait().await, ExecutionOutcome::Killed);
        assert_eq!(status.count("Killed"), 1);
        assert!(supervisor.is_idle());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn cancel_while_starting_gives_up_if_the_start_fails() {
        let dir = tempfile::tempdir().unwrap();
        let supervisor = shell_supervisor(Arc::new(RecordingStatus::new()), dir.path());

        supervisor.reserve().unwrap();
        let canceller = tokio::spawn({
            let supervisor = supervisor.clone();
            async move { supervisor.cancel().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        let _ = supervisor.abort_start("spawn failed".to_string());

        let cancelled = tokio::time::timeout(Duration::from_secs(5), canceller)
            .await
            .expect("cancel should return once the supervisor is idle")
            .unwrap();
        assert!(!cancelled);
        assert!(supervisor.is_idle());
    }
}
