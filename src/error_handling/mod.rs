//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for every stage (input, lookup, storage, control)
//! - Per-run failure statistics
//!
//! Failures are handled at the smallest unit of work (one input line, one
//! address point, one row) and counted here; only initialization errors are
//! fatal.

mod stats;
mod types;

// Re-export public API
pub use stats::ProcessingStats;
pub use types::{
    ControlError, DatabaseError, FailureKind, InitializationError, LookupError, SegmentError,
};
