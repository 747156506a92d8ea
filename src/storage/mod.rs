// storage/mod.rs
// Database operations module

pub mod insert;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod query;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use insert::{insert_range, RangeSink, SqliteRangeSink};
pub use migrations::run_migrations;
pub use models::StoredRange;
pub use pool::init_db_pool_with_path;
pub use query::{count_ranges, fetch_ranges};
