//! Worker pool.
//!
//! A fixed number of workers pull segments from a shared queue, resolve each
//! one into ranges and hand every range to the sink as soon as it is found.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use futures::stream::FuturesUnordered;
use futures::StreamExt;
use log::{info, warn};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::error_handling::{FailureKind, ProcessingStats};
use crate::lookup::GeoLookup;
use crate::resolver::SegmentResolution;
use crate::segment::Segment;
use crate::storage::RangeSink;

/// Counters shared by all workers of one run.
#[derive(Debug, Default)]
pub struct WorkerCounters {
    /// Segments resolved to the end.
    pub segments: AtomicUsize,
    /// Ranges produced (stored or not).
    pub ranges: AtomicUsize,
    /// Addresses whose anchor lookup failed.
    pub abandoned_points: AtomicUsize,
    /// Ranges the sink failed to store.
    pub storage_failures: AtomicUsize,
    /// Segments interrupted by cancellation.
    pub interrupted: AtomicUsize,
}

impl WorkerCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

/// Everything a worker needs, shared between all of them.
pub struct WorkerContext<L, S> {
    pub lookup: Arc<L>,
    pub sink: Arc<S>,
    pub stats: Arc<ProcessingStats>,
    pub counters: Arc<WorkerCounters>,
    pub cancel: CancellationToken,
}

impl<L, S> Clone for WorkerContext<L, S> {
    fn clone(&self) -> Self {
        WorkerContext {
            lookup: Arc::clone(&self.lookup),
            sink: Arc::clone(&self.sink),
            stats: Arc::clone(&self.stats),
            counters: Arc::clone(&self.counters),
            cancel: self.cancel.clone(),
        }
    }
}

/// Runs `count` workers over `queue` and waits until all of them are done.
///
/// Workers exit when the queue is closed and drained, or when the
/// cancellation token fires.
pub async fn run_workers<L, S>(count: usize, queue: mpsc::Receiver<Segment>, ctx: WorkerContext<L, S>)
where
    L: GeoLookup + 'static,
    S: RangeSink + 'static,
{
    let queue = Arc::new(Mutex::new(queue));
    let mut workers = FuturesUnordered::new();

    for id in 0..count {
        let queue = Arc::clone(&queue);
        let ctx = ctx.clone();
        workers.push(tokio::spawn(async move {
            worker_loop(id, queue, ctx).await;
        }));
    }

    while let Some(result) = workers.next().await {
        if let Err(join_error) = result {
            warn!("Worker panicked: {:?}", join_error);
        }
    }
}

async fn worker_loop<L, S>(id: usize, queue: Arc<Mutex<mpsc::Receiver<Segment>>>, ctx: WorkerContext<L, S>)
where
    L: GeoLookup,
    S: RangeSink,
{
    loop {
        let next = {
            let mut queue = queue.lock().await;
            tokio::select! {
                biased;
                _ = ctx.cancel.cancelled() => None,
                segment = queue.recv() => segment,
            }
        };
        let Some(segment) = next else {
            break;
        };
        resolve_and_store(id, segment, &ctx).await;
    }
    log::debug!("Worker {} exiting", id);
}

/// Resolves one segment, saving each range as it is produced.
pub async fn resolve_and_store<L, S>(worker: usize, segment: Segment, ctx: &WorkerContext<L, S>)
where
    L: GeoLookup,
    S: RangeSink,
{
    let started = Instant::now();
    info!("Worker {} resolving {}", worker, segment);

    let mut resolution =
        SegmentResolution::new(segment, ctx.lookup.as_ref(), ctx.cancel.clone()).with_stats(&ctx.stats);

    while let Some(range) = resolution.next_range().await {
        ctx.counters.ranges.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = ctx.sink.save(&range).await {
            ctx.counters.storage_failures.fetch_add(1, Ordering::SeqCst);
            ctx.stats.increment(FailureKind::StorageWrite);
            warn!("Failed to store {} - {}: {}", range.start, range.end, e);
        }
    }

    let summary = resolution.into_summary();
    ctx.counters
        .abandoned_points
        .fetch_add(summary.abandoned.len(), Ordering::SeqCst);

    if summary.cancelled {
        ctx.counters.interrupted.fetch_add(1, Ordering::SeqCst);
        info!(
            "Worker {} interrupted {} after {} ranges ({:.2}s)",
            worker,
            segment,
            summary.ranges,
            started.elapsed().as_secs_f64()
        );
    } else {
        ctx.counters.segments.fetch_add(1, Ordering::SeqCst);
        info!(
            "Worker {} finished {}: {} ranges, {} abandoned, {} lookups in {:.2}s",
            worker,
            segment,
            summary.ranges,
            summary.abandoned.len(),
            summary.lookups,
            started.elapsed().as_secs_f64()
        );
    }
}
