// src/exec/outcome.rs

use std::process::ExitStatus;
use std::time::Duration;

use crate::ui::RunStatus;

/// Observable state of a runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    /// A process is being started or is running.
    Running,
    /// Termination has been requested and not yet confirmed.
    Stopping,
}

/// How one execution ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Completed { code: i32, elapsed: Duration },
    Killed,
    Error { message: String },
}

impl ExecutionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionOutcome::Completed { code: 0, .. })
    }
}

impl From<ExecutionOutcome> for RunStatus {
    fn from(outcome: ExecutionOutcome) -> Self {
        match outcome {
            ExecutionOutcome::Completed { code, elapsed } => RunStatus::Completed { code, elapsed },
            ExecutionOutcome::Killed => RunStatus::Killed,
            ExecutionOutcome::Error { message } => RunStatus::Error { message },
        }
    }
}

/// Exit code as a shell would report it: the process's own code, or
/// `128 + signal` when a signal ended it.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    -1
}

/// Classify a finished process.
///
/// A process we killed, or one whose code equals `killed_exit_code`
/// (`128 + SIGKILL` = 137 by default), is `Killed`. Anything else is
/// `Completed` with its code.
pub fn classify(
    status: ExitStatus,
    killed_by_request: bool,
    killed_exit_code: i32,
    elapsed: Duration,
) -> ExecutionOutcome {
    let code = exit_code(status);
    if killed_by_request || code == killed_exit_code {
        ExecutionOutcome::Killed
    } else {
        ExecutionOutcome::Completed { code, elapsed }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;

    fn exited(code: i32) -> ExitStatus {
        ExitStatus::from_raw(code << 8)
    }

    fn signalled(signal: i32) -> ExitStatus {
        ExitStatus::from_raw(signal)
    }

    #[test]
    fn zero_is_success() {
        let outcome = classify(exited(0), false, 137, Duration::from_millis(3));
        assert!(outcome.is_success());
    }

    #[test]
    fn nonzero_is_completed_with_code() {
        let outcome = classify(exited(1), false, 137, Duration::ZERO);
        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                code: 1,
                elapsed: Duration::ZERO
            }
        );
    }

    #[test]
    fn sigkill_maps_to_killed_without_a_request() {
        assert_eq!(exit_code(signalled(9)), 137);
        assert_eq!(classify(signalled(9), false, 137, Duration::ZERO), ExecutionOutcome::Killed);
    }

    #[test]
    fn exit_137_is_killed() {
        assert_eq!(classify(exited(137), false, 137, Duration::ZERO), ExecutionOutcome::Killed);
    }

    #[test]
    fn requested_kill_wins_over_code() {
        assert_eq!(classify(exited(0), true, 137, Duration::ZERO), ExecutionOutcome::Killed);
    }

    #[test]
    fn other_signals_are_completed() {
        let outcome = classify(signalled(15), false, 137, Duration::ZERO);
        assert_eq!(
            outcome,
            ExecutionOutcome::Completed {
                code: 143,
                elapsed: Duration::ZERO
            }
        );
    }
}
