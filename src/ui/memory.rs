// src/ui/memory.rs

//! In-memory surfaces.
//!
//! Every surface here is internally synchronised, so they can be driven
//! through [`InlineDispatcher`](super::InlineDispatcher) from any thread.
//! Useful for headless embedding and for tests that need to inspect what
//! the core displayed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{ClickHandler, EditorSurface, OutputSurface, Span, StatusIndicator, TagStyle};

fn locked<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct OutputState {
    text: String,
    chars: usize,
    tags: Vec<(Span, TagStyle)>,
    handlers: Vec<(Span, ClickHandler)>,
}

/// Output surface backed by a `String`.
#[derive(Default)]
pub struct MemoryOutput {
    state: Mutex<OutputState>,
}

impl MemoryOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        locked(&self.state).text.clone()
    }

    pub fn tags(&self) -> Vec<(Span, TagStyle)> {
        locked(&self.state).tags.clone()
    }

    /// Text covered by a character span.
    pub fn slice(&self, span: &Span) -> String {
        locked(&self.state)
            .text
            .chars()
            .skip(span.start)
            .take(span.len())
            .collect()
    }

    pub fn handler_count(&self) -> usize {
        locked(&self.state).handlers.len()
    }

    /// Simulate a click with the caret at `caret`.
    ///
    /// Every registered handler is invoked; each decides for itself whether
    /// the caret falls in its range.
    pub fn click(&self, caret: usize) {
        let handlers: Vec<ClickHandler> = locked(&self.state)
            .handlers
            .iter()
            .map(|(_, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(caret);
        }
    }
}

impl OutputSurface for MemoryOutput {
    fn len(&self) -> usize {
        locked(&self.state).chars
    }

    fn append(&self, text: &str) {
        let mut state = locked(&self.state);
        state.text.push_str(text);
        state.chars += text.chars().count();
    }

    fn clear(&self) {
        let mut state = locked(&self.state);
        state.text.clear();
        state.chars = 0;
    }

    fn tag(&self, span: Span, style: TagStyle) {
        locked(&self.state).tags.push((span, style));
    }

    fn clear_tags(&self) {
        let mut state = locked(&self.state);
        state.tags.clear();
        state.handlers.clear();
    }

    fn on_click(&self, span: Span, handler: ClickHandler) {
        locked(&self.state).handlers.push((span, handler));
    }
}

/// Status indicator that keeps every text it was given.
#[derive(Debug, Default)]
pub struct RecordingStatus {
    history: Mutex<Vec<String>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        locked(&self.history).clone()
    }

    pub fn last(&self) -> Option<String> {
        locked(&self.history).last().cloned()
    }

    pub fn count(&self, text: &str) -> usize {
        locked(&self.history).iter().filter(|t| *t == text).count()
    }
}

impl StatusIndicator for RecordingStatus {
    fn set_text(&self, text: &str) {
        locked(&self.history).push(text.to_string());
    }
}

/// Editor holding a fixed text and recording navigation requests.
#[derive(Debug, Default)]
pub struct MemoryEditor {
    text: Mutex<String>,
    navigations: Mutex<Vec<(usize, usize)>>,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            navigations: Mutex::new(Vec::new()),
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *locked(&self.text) = text.into();
    }

    pub fn navigations(&self) -> Vec<(usize, usize)> {
        locked(&self.navigations).clone()
    }
}

impl EditorSurface for MemoryEditor {
    fn text(&self) -> String {
        locked(&self.text).clone()
    }

    fn navigate_to(&self, line: usize, column: usize) {
        locked(&self.navigations).push((line, column));
    }
}
