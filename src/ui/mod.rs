// src/ui/mod.rs

//! Presentation-layer seams.
//!
//! The execution core never touches UI objects directly. It receives:
//! - a [`UiDispatcher`] that runs jobs on whatever thread owns the UI,
//! - an [`OutputSurface`], an [`EditorSurface`] and a [`StatusIndicator`],
//!   which are only ever called from inside dispatched jobs.
//!
//! [`Presenter`] bundles these and is the single entry point worker tasks
//! use. [`memory`] provides in-memory surfaces; [`console`] provides the
//! terminal surfaces used by the `scriptrun` binary.

pub mod console;
pub mod memory;
pub mod presenter;
pub mod status;

use std::ops::Range;
use std::sync::Arc;

pub use presenter::Presenter;
pub use status::RunStatus;

/// Half-open range of character offsets in the output surface.
pub type Span = Range<usize>;

/// Unit of work handed to the UI thread.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Invoked by an output surface on click, with the current caret offset.
pub type ClickHandler = Arc<dyn Fn(usize) + Send + Sync>;

/// Schedules work onto the UI thread.
pub trait UiDispatcher: Send + Sync {
    fn dispatch(&self, job: UiJob);
}

/// Visual tags the core applies to output ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagStyle {
    /// A clickable `file:line:col` location.
    Reference,
}

impl TagStyle {
    pub fn class_name(self) -> &'static str {
        match self {
            TagStyle::Reference => "reference",
        }
    }
}

/// Read-only text area that displays script output.
pub trait OutputSurface: Send + Sync {
    /// Length of the displayed text, in characters.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn append(&self, text: &str);

    fn clear(&self);

    fn tag(&self, span: Span, style: TagStyle);

    /// Remove every tag and every click handler.
    fn clear_tags(&self);

    fn on_click(&self, span: Span, handler: ClickHandler);
}

/// The script editor.
pub trait EditorSurface: Send + Sync {
    fn text(&self) -> String;

    /// Move the caret to a 0-based `(line, column)` and take focus.
    fn navigate_to(&self, line: usize, column: usize);
}

pub trait StatusIndicator: Send + Sync {
    fn set_text(&self, text: &str);
}

/// Runs every job immediately on the calling thread.
///
/// Suitable for surfaces that are already thread-safe, such as the ones in
/// [`memory`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineDispatcher;

impl UiDispatcher for InlineDispatcher {
    fn dispatch(&self, job: UiJob) {
        job();
    }
}
