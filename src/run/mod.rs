//! Collection run: reader → queue → workers → sink.

mod progress;
mod reader;
mod workers;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub use reader::{read_segments, ReaderSummary};
pub use workers::{resolve_and_store, run_workers, WorkerContext, WorkerCounters};

use crate::config::Config;
use crate::error_handling::ProcessingStats;
use crate::initialization::init_client;
use crate::lookup::{build_lookup_client, GeoLookup, RetryPolicy};
use crate::storage::{init_db_pool_with_path, run_migrations, RangeSink, SqliteRangeSink};
use progress::{log_progress, shutdown_gracefully, spawn_progress_logger};

/// Results of a collection run.
#[derive(Debug, Clone, Default)]
pub struct CollectionReport {
    /// Segments resolved to the end
    pub segments: usize,
    /// Ranges produced
    pub ranges: usize,
    /// Addresses skipped because their lookup failed
    pub abandoned_points: usize,
    /// Ranges that could not be written
    pub storage_failures: usize,
    /// Input lines skipped as malformed
    pub parse_failures: usize,
    /// The run was stopped before the input was exhausted
    pub cancelled: bool,
    /// Elapsed time in seconds
    pub elapsed_seconds: f64,
    /// Path to the SQLite database containing results
    pub db_path: PathBuf,
}

/// Runs a collection with the provided configuration.
///
/// Reads segments from `config.ip_file`, resolves them with `config.workers`
/// concurrent workers against the lookup service and writes every range to
/// the database at `config.db_path`. `cancel` stops the run early; ranges
/// already written stay valid.
///
/// # Errors
///
/// Only startup failures are returned:
/// - invalid configuration
/// - the input file cannot be opened
/// - the database cannot be opened or migrated
/// - the HTTP client cannot be built
///
/// Everything after startup is logged and counted instead.
///
/// # Example
///
/// ```no_run
/// use ip_warehouse::{run_collection, Config};
/// use std::path::PathBuf;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config {
///     ip_file: PathBuf::from("segments.txt"),
///     ..Default::default()
/// };
/// let report = run_collection(config, CancellationToken::new()).await?;
/// println!("Stored {} ranges", report.ranges);
/// # Ok(())
/// # }
/// ```
pub async fn run_collection(config: Config, cancel: CancellationToken) -> Result<CollectionReport> {
    config.validate().context("Invalid configuration")?;
    if config.daemon {
        info!("Daemon mode requested; running in the foreground");
    }

    let input = tokio::fs::File::open(&config.ip_file)
        .await
        .with_context(|| format!("Failed to open input file {}", config.ip_file.display()))?;

    let pool = init_db_pool_with_path(&config.db_path)
        .await
        .context("Failed to initialize database pool")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let client = init_client(config.timeout_seconds).context("Failed to initialize HTTP client")?;
    let lookup = Arc::new(build_lookup_client(
        client,
        &config.url_base,
        RetryPolicy::default(),
    ));
    let sink = Arc::new(SqliteRangeSink::new(pool.as_ref().clone()));

    info!(
        "Collecting {} with {} workers into {}",
        config.ip_file.display(),
        config.workers,
        config.db_path.display()
    );
    let report = collect_segments(BufReader::new(input), lookup, sink, config.workers, cancel).await;

    pool.close().await;

    Ok(CollectionReport {
        db_path: config.db_path,
        ..report
    })
}

/// Drives one run over an arbitrary input, lookup and sink.
///
/// The returned report has an empty `db_path`.
pub async fn collect_segments<R, L, S>(
    input: R,
    lookup: Arc<L>,
    sink: Arc<S>,
    workers: usize,
    cancel: CancellationToken,
) -> CollectionReport
where
    R: AsyncBufRead + Unpin + Send + 'static,
    L: GeoLookup + 'static,
    S: RangeSink + 'static,
{
    let start_time = Instant::now();
    let workers = workers.max(1);
    let stats = Arc::new(ProcessingStats::new());
    let counters = Arc::new(WorkerCounters::new());

    let (tx, rx) = mpsc::channel(workers);
    let reader_stats = Arc::clone(&stats);
    let reader_cancel = cancel.clone();
    let reader = tokio::spawn(async move {
        read_segments(input, tx, reader_cancel, &reader_stats).await
    });

    let progress_cancel = CancellationToken::new();
    let logging_task = spawn_progress_logger(
        start_time,
        Arc::clone(&counters),
        progress_cancel.child_token(),
    );

    let ctx = WorkerContext {
        lookup,
        sink,
        stats: Arc::clone(&stats),
        counters: Arc::clone(&counters),
        cancel: cancel.clone(),
    };
    run_workers(workers, rx, ctx).await;

    let reader_summary = match reader.await {
        Ok(summary) => summary,
        Err(join_error) => {
            warn!("Segment reader panicked: {:?}", join_error);
            ReaderSummary::default()
        }
    };

    shutdown_gracefully(progress_cancel, logging_task).await;
    log_progress(start_time, &counters);
    stats.log_summary();

    let cancelled = cancel.is_cancelled();
    if cancelled {
        warn!("Collection stopped before the input was exhausted");
    }

    CollectionReport {
        segments: WorkerCounters::load(&counters.segments),
        ranges: WorkerCounters::load(&counters.ranges),
        abandoned_points: WorkerCounters::load(&counters.abandoned_points),
        storage_failures: WorkerCounters::load(&counters.storage_failures),
        parse_failures: reader_summary.parse_failures,
        cancelled,
        elapsed_seconds: start_time.elapsed().as_secs_f64(),
        db_path: PathBuf::new(),
    }
}
