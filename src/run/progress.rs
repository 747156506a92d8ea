//! Progress logging and shutdown of the progress task.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::workers::WorkerCounters;
use crate::config::LOGGING_INTERVAL;

/// Logs how far the run has got.
pub fn log_progress(start_time: Instant, counters: &WorkerCounters) {
    let elapsed_secs = start_time.elapsed().as_secs_f64();
    let segments = WorkerCounters::load(&counters.segments);
    let ranges = WorkerCounters::load(&counters.ranges);
    let rate = if elapsed_secs > 0.0 {
        segments as f64 / elapsed_secs
    } else {
        0.0
    };
    info!(
        "Resolved {} segments into {} ranges in {:.2} seconds (~{:.2} segments/sec)",
        segments, ranges, elapsed_secs, rate
    );
}

/// Spawns a task logging progress every [`LOGGING_INTERVAL`] seconds until
/// `cancel` fires.
pub fn spawn_progress_logger(
    start_time: Instant,
    counters: Arc<WorkerCounters>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(LOGGING_INTERVAL));
        // the first tick completes immediately
        interval.tick().await;
        loop {
            tokio::select! {
                _ = interval.tick() => log_progress(start_time, &counters),
                _ = cancel.cancelled() => break,
            }
        }
    })
}

/// Stops the progress task and waits for it.
pub async fn shutdown_gracefully(cancel: CancellationToken, logging_task: JoinHandle<()>) {
    cancel.cancel();
    let _ = logging_task.await;
}
