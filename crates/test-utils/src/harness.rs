use std::sync::Arc;

use scriptrun::config::RunnerConfig;
use scriptrun::runner::ScriptRunner;
use scriptrun::toolchain::ToolchainProbe;
use scriptrun::ui::memory::{MemoryEditor, MemoryOutput, RecordingStatus};
use scriptrun::ui::{InlineDispatcher, Presenter};
use tokio::runtime::Handle;

/// A runner wired to in-memory surfaces.
pub struct Harness {
    pub output: Arc<MemoryOutput>,
    pub status: Arc<RecordingStatus>,
    pub editor: Arc<MemoryEditor>,
    pub runner: ScriptRunner,
}

impl Harness {
    /// Uses the real PATH probe. Must be called inside a Tokio runtime.
    pub fn new(config: RunnerConfig) -> Self {
        Self::build(config, None)
    }

    /// Uses `probe` instead of a PATH lookup.
    pub fn with_probe(config: RunnerConfig, probe: Arc<dyn ToolchainProbe>) -> Self {
        Self::build(config, Some(probe))
    }

    fn build(config: RunnerConfig, probe: Option<Arc<dyn ToolchainProbe>>) -> Self {
        let output = Arc::new(MemoryOutput::new());
        let status = Arc::new(RecordingStatus::new());
        let editor = Arc::new(MemoryEditor::new(""));
        let presenter = Presenter::new(
            Arc::new(InlineDispatcher),
            output.clone(),
            status.clone(),
            editor.clone(),
        );

        let runner = match probe {
            Some(probe) => ScriptRunner::with_probe(config, presenter, Handle::current(), probe),
            None => ScriptRunner::new(config, presenter, Handle::current()),
        };

        Self {
            output,
            status,
            editor,
            runner,
        }
    }
}

/// Probe with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub bool);

impl ToolchainProbe for StaticProbe {
    fn is_available(&self) -> bool {
        self.0
    }

    fn warm(&self) {}
}
