// src/exec/drain.rs

//! Drain loop: relays the merged output of a script process to the UI.

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::ui::Presenter;

/// What the drain loop hands to the exit-wait task when it stops.
#[derive(Debug, Default)]
pub(crate) struct DrainReport {
    /// Everything relayed to the UI, in order.
    pub output: String,
    /// Total artificial pause time, excluded from elapsed time.
    pub throttled: Duration,
    /// `true` if every stream reached end-of-input; `false` if the loop
    /// stopped because cancellation was requested.
    pub reached_eof: bool,
}

/// Read `stream` line by line and forward each line, newline-terminated.
///
/// The supervisor runs one pump over the pipe the child writes both its
/// stdout and stderr to.
pub(crate) fn spawn_pump<R>(
    runtime: &Handle,
    stream: R,
    tx: mpsc::Sender<String>,
    label: &'static str,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    runtime.spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let mut line = String::from_utf8_lossy(&buf).into_owned();
                    if !line.ends_with('\n') {
                        line.push('\n');
                    }
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!(stream = label, error = %e, "read error; stopping pump");
                    break;
                }
            }
        }

        trace!(stream = label, "pump finished");
    })
}

/// Relay chunks until every pump is done or cancellation is requested.
///
/// Each chunk is appended to the report before being forwarded, so the
/// report always matches what was rendered.
pub(crate) async fn drain_output(
    mut chunks: mpsc::Receiver<String>,
    mut cancel: watch::Receiver<bool>,
    presenter: Presenter,
    throttle: Duration,
    pumps: Vec<JoinHandle<()>>,
) -> DrainReport {
    let mut report = DrainReport::default();

    loop {
        if *cancel.borrow_and_update() {
            debug!("cancellation observed; drain loop stopping");
            break;
        }

        tokio::select! {
            changed = cancel.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            chunk = chunks.recv() => match chunk {
                Some(chunk) => {
                    report.output.push_str(&chunk);
                    presenter.render(chunk);

                    if !throttle.is_zero() {
                        tokio::time::sleep(throttle).await;
                        report.throttled += throttle;
                    }
                }
                None => {
                    report.reached_eof = true;
                    break;
                }
            },
        }
    }

    for pump in pumps {
        pump.abort();
    }

    debug!(
        bytes = report.output.len(),
        reached_eof = report.reached_eof,
        "drain loop finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::ui::InlineDispatcher;
    use crate::ui::memory::{MemoryEditor, MemoryOutput, RecordingStatus};

    fn presenter() -> (Presenter, Arc<MemoryOutput>) {
        let output = Arc::new(MemoryOutput::new());
        let presenter = Presenter::new(
            Arc::new(InlineDispatcher),
            output.clone(),
            Arc::new(RecordingStatus::new()),
            Arc::new(MemoryEditor::new("")),
        );
        (presenter, output)
    }

    #[tokio::test]
    async fn relays_everything_until_senders_close() {
        let (presenter, output) = presenter();
        let (tx, rx) = mpsc::channel(8);
        let (_cancel_tx, cancel_rx) = watch::channel(false);

        tx.send("1\n".to_string()).await.unwrap();
        tx.send("2\n".to_string()).await.unwrap();
        drop(tx);

        let report = drain_output(rx, cancel_rx, presenter, Duration::ZERO, Vec::new()).await;
        assert!(report.reached_eof);
        assert_eq!(report.output, "1\n2\n");
        assert_eq!(output.text(), "1\n2\n");
    }

    #[tokio::test]
    async fn stops_on_cancel_even_if_stream_stays_open() {
        let (presenter, output) = presenter();
        let (tx, rx) = mpsc::channel(8);
        let (cancel_tx, cancel_rx) = watch::channel(false);

        tx.send("before\n".to_string()).await.unwrap();
        let drain = tokio::spawn(drain_output(rx, cancel_rx, presenter, Duration::ZERO, Vec::new()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        cancel_tx.send_replace(true);

        let report = tokio::time::timeout(Duration::from_secs(5), drain)
            .await
            .expect("drain should stop after cancel")
            .unwrap();
        assert!(!report.reached_eof);

        // Nothing sent after the cancel is rendered.
        let _ = tx.send("after\n".to_string()).await;
        assert_eq!(output.text(), "before\n");
    }

    #[tokio::test]
    async fn throttle_time_is_accounted() {
        let (presenter, _output) = presenter();
        let (tx, rx) = mpsc::channel(8);
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        for i in 0..3 {
            tx.send(format!("{i}\n")).await.unwrap();
        }
        drop(tx);

        let report = drain_output(rx, cancel_rx, presenter, Duration::from_millis(5), Vec::new()).await;
        assert_eq!(report.throttled, Duration::from_millis(15));
    }

    #[tokio::test]
    async fn pump_terminates_last_line() {
        let (tx, mut rx) = mpsc::channel(8);
        let pump = spawn_pump(&Handle::current(), &b"a\nno newline"[..], tx, "test");
        pump.await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("a\n"));
        assert_eq!(rx.recv().await.as_deref(), Some("no newline\n"));
        assert!(rx.recv().await.is_none());
    }
}
