//! Processing statistics tracking.
//!
//! Thread-safe counters for every failure category seen during a run, shared
//! between the segment reader and all workers.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use strum::IntoEnumIterator;

use super::types::FailureKind;

/// Thread-safe failure statistics tracker.
///
/// Every [`FailureKind`] is initialized to zero on creation so lookups never
/// miss. Share it across tasks with `Arc`.
pub struct ProcessingStats {
    failures: HashMap<FailureKind, AtomicUsize>,
}

impl ProcessingStats {
    pub fn new() -> Self {
        let mut failures = HashMap::new();
        for kind in FailureKind::iter() {
            failures.insert(kind, AtomicUsize::new(0));
        }
        ProcessingStats { failures }
    }

    /// Increment a failure counter.
    pub fn increment(&self, kind: FailureKind) {
        if let Some(counter) = self.failures.get(&kind) {
            counter.fetch_add(1, Ordering::Relaxed);
        } else {
            log::error!(
                "Attempted to increment failure counter for {:?} which is not in the map",
                kind
            );
        }
    }

    /// Get the count for a failure kind.
    pub fn get_count(&self, kind: FailureKind) -> usize {
        self.failures
            .get(&kind)
            .map(|c| c.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Total failures across all categories.
    pub fn total(&self) -> usize {
        self.failures
            .values()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    /// Logs one line per non-zero failure category.
    pub fn log_summary(&self) {
        let total = self.total();
        if total == 0 {
            log::info!("No failures recorded");
            return;
        }
        log::info!("Failure counts ({} total):", total);
        for kind in FailureKind::iter() {
            let count = self.get_count(kind);
            if count > 0 {
                log::info!("   {}: {}", kind, count);
            }
        }
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}
