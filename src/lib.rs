//! ip_warehouse library: IP geolocation range collection
//!
//! This library reads IPv4 address segments, resolves each one into the
//! smallest set of contiguous ranges sharing a geolocation record (via a remote
//! lookup service and a binary boundary search) and stores every range in a
//! SQLite database.
//!
//! # Example
//!
//! ```no_run
//! use ip_warehouse::{run_collection, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     ip_file: std::path::PathBuf::from("segments.txt"),
//!     workers: 4,
//!     ..Default::default()
//! };
//!
//! let report = run_collection(config, CancellationToken::new()).await?;
//! println!("Stored {} ranges from {} segments", report.ranges, report.segments);
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod address;
pub mod config;
pub mod error_handling;
pub mod initialization;
pub mod lookup;
pub mod resolver;
pub mod run;
pub mod segment;
pub mod storage;
pub mod supervisor;

// Re-export public API
pub use address::Address;
pub use config::{Config, ControlSignal, LogFormat, LogLevel, Opt};
pub use error_handling::{
    ControlError, DatabaseError, InitializationError, LookupError, SegmentError,
};
pub use lookup::{GeoLookup, GeoRecord, RetryPolicy};
pub use resolver::{resolve_segment, ResolvedRange, SegmentResolution};
pub use run::{collect_segments, run_collection, CollectionReport};
pub use segment::{parse_segment, Segment};
pub use storage::{fetch_ranges, run_migrations, RangeSink, StoredRange};
pub use supervisor::{send_control_signal, Supervisor};
