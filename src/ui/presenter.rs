// src/ui/presenter.rs

use std::sync::Arc;

use tracing::debug;

use crate::annotate::Annotator;

use super::{EditorSurface, OutputSurface, RunStatus, StatusIndicator, UiDispatcher};

/// The only path from worker tasks to UI surfaces.
///
/// Every method schedules a job through the dispatcher and returns without
/// waiting for it. Jobs submitted from one task are applied in submission
/// order as long as the dispatcher is FIFO.
#[derive(Clone)]
pub struct Presenter {
    dispatcher: Arc<dyn UiDispatcher>,
    output: Arc<dyn OutputSurface>,
    status: Arc<dyn StatusIndicator>,
    editor: Arc<dyn EditorSurface>,
    annotator: Arc<Annotator>,
}

impl Presenter {
    pub fn new(
        dispatcher: Arc<dyn UiDispatcher>,
        output: Arc<dyn OutputSurface>,
        status: Arc<dyn StatusIndicator>,
        editor: Arc<dyn EditorSurface>,
    ) -> Self {
        let annotator = Arc::new(Annotator::new(Arc::clone(&output), Arc::clone(&editor)));
        Self {
            dispatcher,
            output,
            status,
            editor,
            annotator,
        }
    }

    /// Append an output chunk, annotating location references.
    pub fn render(&self, chunk: String) {
        let annotator = Arc::clone(&self.annotator);
        self.dispatcher
            .dispatch(Box::new(move || annotator.render(&chunk)));
    }

    /// Show `status`, adjusting the output area as the status requires.
    pub fn report_status(&self, status: RunStatus) {
        debug!(%status, "reporting status");
        let output = Arc::clone(&self.output);
        let indicator = Arc::clone(&self.status);
        self.dispatcher.dispatch(Box::new(move || {
            indicator.set_text(&status.to_string());
            if status.clears_output() {
                output.clear();
            }
            if let Some(text) = status.output_text() {
                output.append(&text);
            }
        }));
    }

    pub fn clear_annotations(&self) {
        let annotator = Arc::clone(&self.annotator);
        self.dispatcher
            .dispatch(Box::new(move || annotator.clear_annotations()));
    }

    /// Editor text at the time of the call.
    ///
    /// Reads go straight to the surface; callers are expected to be on the
    /// UI thread, as a run button handler would be.
    pub fn editor_text(&self) -> String {
        self.editor.text()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ui::InlineDispatcher;
    use crate::ui::memory::{MemoryEditor, MemoryOutput, RecordingStatus};

    fn presenter() -> (Presenter, Arc<MemoryOutput>, Arc<RecordingStatus>) {
        let output = Arc::new(MemoryOutput::new());
        let status = Arc::new(RecordingStatus::new());
        let editor = Arc::new(MemoryEditor::new("println(1)"));
        let presenter = Presenter::new(
            Arc::new(InlineDispatcher),
            output.clone(),
            status.clone(),
            editor,
        );
        (presenter, output, status)
    }

    #[test]
    fn running_clears_previous_output() {
        let (presenter, output, status) = presenter();
        presenter.render("old\n".to_string());
        presenter.report_status(RunStatus::Running);
        presenter.render("new\n".to_string());
        assert_eq!(output.text(), "new\n");
        assert_eq!(status.last().as_deref(), Some("Running..."));
    }

    #[test]
    fn completion_keeps_output() {
        let (presenter, output, status) = presenter();
        presenter.render("2\n".to_string());
        presenter.report_status(RunStatus::Completed {
            code: 0,
            elapsed: Duration::from_millis(5),
        });
        assert_eq!(output.text(), "2\n");
        assert_eq!(status.last().as_deref(), Some("Exit code: 0 (0 s, 5 ms)"));
    }

    #[test]
    fn error_replaces_output_with_message() {
        let (presenter, output, _status) = presenter();
        presenter.render("partial\n".to_string());
        presenter.report_status(RunStatus::Error {
            message: "permission denied".to_string(),
        });
        assert_eq!(output.text(), "permission denied");
    }

    #[test]
    fn editor_text_reads_the_editor() {
        let (presenter, _output, _status) = presenter();
        assert_eq!(presenter.editor_text(), "println(1)");
    }
}
