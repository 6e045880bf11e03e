use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A non-empty input line and its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub number: usize,
    pub text: String,
}

/// Spawns a task that reads lines from `reader` and forwards them over a
/// bounded channel, so the caller can submit batches while input is still
/// being read.
///
/// Empty lines are skipped but still counted, so line numbers match the
/// input. The task stops at EOF, on the first I/O error (logged), or once the
/// receiver is dropped.
pub fn concurrent_lines<R: AsyncRead + Unpin + Send + 'static>(
    reader: R,
    channel_capacity: usize,
) -> (JoinHandle<()>, mpsc::Receiver<Line>) {
    let (tx, rx) = mpsc::channel::<Line>(channel_capacity.max(1));
    let buffer = BufReader::new(reader);

    let task = tokio::spawn(async move {
        let mut lines = buffer.lines();
        let mut number = 0;
        loop {
            match lines.next_line().await {
                Ok(Some(text)) => {
                    number += 1;
                    if text.is_empty() {
                        continue;
                    }
                    if tx.send(Line { number, text }).await.is_err() {
                        log::debug!("line receiver dropped after {number} lines");
                        break;
                    }
                }
                Ok(None) => {
                    log::trace!("reached EOF after {number} lines");
                    break;
                }
                Err(e) => {
                    log::error!("I/O error after line {number}: {e}. Stopping reader.");
                    break;
                }
            }
        }
    });

    (task, rx)
}

/// Collects up to `size` lines, returning an empty batch once input is exhausted.
pub async fn next_batch(rx: &mut mpsc::Receiver<Line>, size: usize) -> Vec<Line> {
    let mut batch = Vec::with_capacity(size);
    while batch.len() < size {
        match rx.recv().await {
            Some(line) => batch.push(line),
            None => break,
        }
    }
    batch
}
