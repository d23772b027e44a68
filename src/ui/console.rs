// src/ui/console.rs

//! Terminal presentation used by the `scriptrun` binary.
//!
//! - Output goes to STDOUT as it arrives.
//! - Status changes go to STDERR, prefixed with `[status]`.
//! - A dedicated UI thread executes dispatched jobs in FIFO order.

use std::io::Write;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use super::{ClickHandler, EditorSurface, OutputSurface, Span, StatusIndicator, TagStyle};
use super::{UiDispatcher, UiJob};

/// Dispatcher feeding the UI thread started by [`spawn_ui_thread`].
#[derive(Debug, Clone)]
pub struct ChannelDispatcher {
    tx: mpsc::UnboundedSender<UiJob>,
}

impl UiDispatcher for ChannelDispatcher {
    fn dispatch(&self, job: UiJob) {
        if self.tx.send(job).is_err() {
            debug!("UI thread has stopped; dropping job");
        }
    }
}

/// Start the UI thread.
///
/// The thread runs until every clone of the returned dispatcher has been
/// dropped and the queue is empty, so joining it flushes pending output.
pub fn spawn_ui_thread() -> std::io::Result<(ChannelDispatcher, JoinHandle<()>)> {
    let (tx, mut rx) = mpsc::unbounded_channel::<UiJob>();

    let handle = std::thread::Builder::new()
        .name("scriptrun-ui".to_string())
        .spawn(move || {
            while let Some(job) = rx.blocking_recv() {
                job();
            }
            debug!("UI thread finished (channel closed)");
        })?;

    Ok((ChannelDispatcher { tx }, handle))
}

/// STDOUT-backed output surface.
///
/// A terminal cannot retract printed text or host click handlers, so
/// `clear` only resets the character count used for offsets and tags are
/// logged rather than drawn.
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    chars: AtomicUsize,
}

impl ConsoleOutput {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSurface for ConsoleOutput {
    fn len(&self) -> usize {
        self.chars.load(Ordering::SeqCst)
    }

    fn append(&self, text: &str) {
        let mut stdout = std::io::stdout().lock();
        if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
            warn!(error = %e, "failed to write script output to stdout");
        }
        self.chars.fetch_add(text.chars().count(), Ordering::SeqCst);
    }

    fn clear(&self) {
        self.chars.store(0, Ordering::SeqCst);
    }

    fn tag(&self, span: Span, style: TagStyle) {
        debug!(?span, style = style.class_name(), "output tagged");
    }

    fn clear_tags(&self) {}

    fn on_click(&self, span: Span, _handler: ClickHandler) {
        trace!(?span, "click handlers are not supported on a terminal");
    }
}

/// Writes each status to STDERR.
#[derive(Debug, Default)]
pub struct ConsoleStatus;

impl StatusIndicator for ConsoleStatus {
    fn set_text(&self, text: &str) {
        eprintln!("[status] {text}");
    }
}

/// Editor stand-in holding the script text read from disk or stdin.
#[derive(Debug)]
pub struct ConsoleEditor {
    text: Mutex<String>,
}

impl ConsoleEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
        }
    }
}

impl EditorSurface for ConsoleEditor {
    fn text(&self) -> String {
        self.text
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn navigate_to(&self, line: usize, column: usize) {
        info!(line = line + 1, column = column + 1, "navigate to script location");
    }
}
