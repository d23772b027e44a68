// src/ui/status.rs

use std::fmt;
use std::time::Duration;

/// Every state the status indicator can show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunStatus {
    Ready,
    Running,
    FromCache,
    /// The process exited on its own. Non-zero codes are script failures or
    /// compiler diagnostics, not runner errors.
    Completed { code: i32, elapsed: Duration },
    Killed,
    /// Starting the process failed; `message` replaces the output.
    Error { message: String },
    ToolchainMissing { program: String },
}

impl RunStatus {
    /// Text placed in the output area alongside this status, if any.
    pub fn output_text(&self) -> Option<String> {
        match self {
            RunStatus::Error { message } => Some(message.clone()),
            RunStatus::ToolchainMissing { program } => Some(format!(
                "Error: {program} not installed.\nPlease install it and add it to PATH."
            )),
            _ => None,
        }
    }

    /// Whether the output area is wiped when this status is shown.
    pub fn clears_output(&self) -> bool {
        matches!(
            self,
            RunStatus::Running
                | RunStatus::FromCache
                | RunStatus::Error { .. }
                | RunStatus::ToolchainMissing { .. }
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed { .. } | RunStatus::Killed | RunStatus::Error { .. }
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Ready => f.write_str("Ready"),
            RunStatus::Running => f.write_str("Running..."),
            RunStatus::FromCache => f.write_str("From cache"),
            RunStatus::Completed { code, elapsed } => {
                write!(f, "Exit code: {code} ({})", format_elapsed(*elapsed))
            }
            RunStatus::Killed => f.write_str("Killed"),
            RunStatus::Error { .. } | RunStatus::ToolchainMissing { .. } => f.write_str("Error"),
        }
    }
}

/// `"<seconds> s, <millis> ms"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{} s, {} ms", elapsed.as_secs(), elapsed.subsec_millis())
}
