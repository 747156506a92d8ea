//! Segment reader.
//!
//! Streams the input line by line, parses each line into a [`Segment`] and
//! feeds the worker queue. Dropping the sender when done closes the queue.

use std::io::ErrorKind;

use log::{debug, warn};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error_handling::{FailureKind, ProcessingStats};
use crate::segment::{is_ignorable_line, parse_segment, Segment};

/// What the reader saw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReaderSummary {
    /// Lines read, including blank and comment lines.
    pub lines: usize,
    /// Segments handed to the queue.
    pub queued: usize,
    /// Lines that failed to parse and were skipped.
    pub parse_failures: usize,
}

/// Reads segments from `input` into `queue` until the input ends, the queue
/// closes or `cancel` fires.
pub async fn read_segments<R>(
    input: R,
    queue: mpsc::Sender<Segment>,
    cancel: CancellationToken,
    stats: &ProcessingStats,
) -> ReaderSummary
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = ReaderSummary::default();
    let mut lines = input.lines();

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Segment reader cancelled after {} lines", summary.lines);
                break;
            }
            next = lines.next_line() => next,
        };

        let line = match next {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                summary.lines += 1;
                summary.parse_failures += 1;
                stats.increment(FailureKind::MalformedSegment);
                warn!("Skipping unreadable input line {}: {}", summary.lines, e);
                continue;
            }
            Err(e) => {
                warn!("Failed to read input after {} lines: {}", summary.lines, e);
                break;
            }
        };
        summary.lines += 1;

        if is_ignorable_line(&line) {
            continue;
        }

        let segment = match parse_segment(&line) {
            Ok(segment) => segment,
            Err(e) => {
                summary.parse_failures += 1;
                stats.increment(FailureKind::from(&e));
                warn!("Skipping input line {}: {}", summary.lines, e);
                continue;
            }
        };

        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            sent = queue.send(segment) => sent,
        };
        if sent.is_err() {
            debug!("Segment queue closed, reader stopping");
            break;
        }
        summary.queued += 1;
    }

    summary
}
