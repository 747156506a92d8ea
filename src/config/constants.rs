//! Configuration constants.
//!
//! This module defines the constants used throughout the application,
//! including defaults for every configuration key, retry parameters and the
//! fixed values of the lookup protocol.

// Defaults for configuration keys
/// Default input file with one segment per line
pub const DEFAULT_IP_FILE: &str = "./ip_segments.txt";
/// Default lookup endpoint; the dotted-quad address is appended verbatim
pub const DEFAULT_URL_BASE: &str = "http://ip.taobao.com/service/getIpInfo.php?ip=";
/// Default number of concurrent workers (the `batchNum` key)
pub const DEFAULT_WORKERS: usize = 10;
pub const DB_PATH: &str = "./ip_warehouse.db";
pub const PID_PATH: &str = "./ip_warehouse.pid";

// Network operation timeouts
/// Per-request timeout in seconds for lookup calls
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

/// User-Agent sent with every lookup request.
///
/// The lookup service has historically been queried with this identifier and
/// some deployments filter on it, so it is kept fixed.
pub const LOOKUP_USER_AGENT: &str =
    "Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.0; Trident/4.0)";

// Retry strategy
/// Maximum number of lookup attempts per address (including the first)
pub const RETRY_MAX_ATTEMPTS: u32 = 5;
/// Delay before the first retry, in seconds
pub const RETRY_INITIAL_DELAY_SECS: u64 = 1;
/// Factor by which the retry delay is multiplied after each attempt
pub const RETRY_FACTOR: u32 = 2;

// Lookup data
/// Stored in place of empty string fields from the lookup service
pub const EMPTY_FIELD_PLACEHOLDER: &str = "-";
/// Country ids the lookup service does not subdivide into regions/cities.
/// Two records with one of these ids are equal whenever the ids match.
pub const UNSUBDIVIDED_COUNTRY_IDS: &[&str] = &["HK", "TW", "MO"];

/// Seconds between progress log lines during a run
pub const LOGGING_INTERVAL: u64 = 5;

/// How long a SQLite writer waits on a locked database before failing
pub const DB_BUSY_TIMEOUT_SECS: u64 = 30;
