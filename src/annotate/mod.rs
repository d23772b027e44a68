// src/annotate/mod.rs

//! Output annotation: appends output to the output surface and turns
//! `file:line:col` references into click-to-navigate links.
//!
//! All methods here touch UI surfaces and must run on the UI thread, i.e.
//! inside a job handed to a [`UiDispatcher`](crate::ui::UiDispatcher).

pub mod location;

use std::sync::Arc;

use tracing::trace;

use crate::ui::{EditorSurface, OutputSurface, TagStyle};

pub use location::{LocationReference, parse_line};

pub struct Annotator {
    output: Arc<dyn OutputSurface>,
    editor: Arc<dyn EditorSurface>,
}

impl Annotator {
    pub fn new(output: Arc<dyn OutputSurface>, editor: Arc<dyn EditorSurface>) -> Self {
        Self { output, editor }
    }

    /// Append `chunk` line by line, tagging every location reference.
    pub fn render(&self, chunk: &str) {
        for line in chunk.split_inclusive('\n') {
            let offset = self.output.len();
            self.output.append(line);

            let body = line.trim_end_matches(['\n', '\r']);
            if let Some(reference) = parse_line(body, offset) {
                self.link(reference);
            }
        }
    }

    /// Drop every tag and navigation handler from earlier runs.
    pub fn clear_annotations(&self) {
        self.output.clear_tags();
    }

    fn link(&self, reference: LocationReference) {
        trace!(
            line = reference.line,
            column = reference.column,
            span = ?reference.span,
            "tagging location reference"
        );

        self.output.tag(reference.span.clone(), TagStyle::Reference);

        let editor = Arc::clone(&self.editor);
        let span = reference.span.clone();
        self.output.on_click(
            span,
            Arc::new(move |caret| {
                if reference.contains(caret) {
                    editor.navigate_to(reference.line, reference.column);
                }
            }),
        );
    }
}
