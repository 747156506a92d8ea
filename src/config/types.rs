//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_IP_FILE, DEFAULT_TIMEOUT_SECS, DEFAULT_URL_BASE, DEFAULT_WORKERS, PID_PATH,
};
use crate::config::file::FileConfig;
use crate::error_handling::InitializationError;

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

/// Control signal sent to an already running collector with `-s`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ControlSignal {
    /// Ask the running instance to re-read its configuration
    Reload,
    /// Ask the running instance to stop after in-flight lookups
    Stop,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use ip_warehouse::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     ip_file: PathBuf::from("segments.txt"),
///     workers: 4,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Input file, one segment per line
    pub ip_file: PathBuf,

    /// Lookup endpoint; the dotted-quad address is appended verbatim
    pub url_base: String,

    /// Number of concurrent workers
    pub workers: usize,

    /// Database path (SQLite file)
    pub db_path: PathBuf,

    /// Log file; logs go to stderr when unset
    pub log_file: Option<PathBuf>,

    /// Pid file owned by the running instance
    pub pid_file: PathBuf,

    /// Requested daemon mode. Only logged; the process stays in the foreground.
    pub daemon: bool,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ip_file: PathBuf::from(DEFAULT_IP_FILE),
            url_base: DEFAULT_URL_BASE.to_string(),
            workers: DEFAULT_WORKERS,
            db_path: PathBuf::from(DB_PATH),
            log_file: None,
            pid_file: PathBuf::from(PID_PATH),
            daemon: false,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

impl Config {
    /// Overlays the keys present in a config file onto `self`.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(ip_file) = file.ip_file {
            self.ip_file = ip_file;
        }
        if let Some(url_base) = file.url_base {
            self.url_base = url_base;
        }
        if let Some(workers) = file.batch_num {
            self.workers = workers;
        }
        if let Some(db_file) = file.db_file {
            self.db_path = db_file;
        }
        if let Some(log_file) = file.log_file {
            self.log_file = Some(log_file);
        }
        if let Some(pid) = file.pid {
            self.pid_file = pid;
        }
        if let Some(daemon) = file.daemon {
            self.daemon = daemon.eq_ignore_ascii_case("on");
        }
        if let Some(timeout) = file.timeout_seconds {
            self.timeout_seconds = timeout;
        }
    }

    /// Rejects values the collector cannot run with.
    pub fn validate(&self) -> Result<(), InitializationError> {
        if self.workers == 0 {
            return Err(InitializationError::ConfigError(
                "worker count (batchNum) must be at least 1".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(InitializationError::ConfigError(
                "timeout must be at least 1 second".to_string(),
            ));
        }
        // The address is appended verbatim, so the base itself must already be
        // an absolute http(s) URL.
        match url::Url::parse(&self.url_base) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
            Ok(parsed) => Err(InitializationError::ConfigError(format!(
                "urlBase must use http or https, got {}",
                parsed.scheme()
            ))),
            Err(e) => Err(InitializationError::ConfigError(format!(
                "invalid urlBase {:?}: {}",
                self.url_base, e
            ))),
        }
    }
}

/// Command-line options.
///
/// Precedence, lowest first: built-in defaults, the JSON config file, then
/// the explicit flags below.
///
/// # Examples
///
/// ```bash
/// # Use ./conf/config.json if present
/// ip_warehouse
///
/// # Config file under another root
/// ip_warehouse -p /srv/collector/ -c conf/prod.json
///
/// # Stop the running instance
/// ip_warehouse -s stop
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "ip_warehouse",
    about = "Collects geolocation ranges for IPv4 segments into SQLite."
)]
pub struct Opt {
    /// Root path the config file is resolved against
    #[arg(short = 'p', long, default_value = "./")]
    pub prefix: PathBuf,

    /// Config file relative to the prefix [default: conf/config.json if it exists]
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Send a control signal to the running instance and exit
    #[arg(short = 's', long, value_enum)]
    pub signal: Option<ControlSignal>,

    /// Input file with one segment per line
    #[arg(long)]
    pub ip_file: Option<PathBuf>,

    /// Lookup endpoint prefix
    #[arg(long)]
    pub url_base: Option<String>,

    /// Number of concurrent workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Database path (SQLite file)
    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Pid file path
    #[arg(long)]
    pub pid_file: Option<PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

/// Config file used when `-c` is not given.
const DEFAULT_CONFIG_FILE: &str = "conf/config.json";

impl Opt {
    /// The config file to load, if any.
    ///
    /// An explicit `-c` is always returned (and must exist); the default
    /// location is only used when present.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(resolve(&self.prefix, path)),
            None => {
                let default = resolve(&self.prefix, Path::new(DEFAULT_CONFIG_FILE));
                default.is_file().then_some(default)
            }
        }
    }

    /// Builds the effective configuration: defaults, then the config file,
    /// then explicit flags.
    pub fn into_config(self) -> Result<Config, InitializationError> {
        let mut config = Config::default();
        if let Some(path) = self.config_path() {
            config.apply_file(FileConfig::load(&path)?);
        }

        if let Some(ip_file) = self.ip_file {
            config.ip_file = ip_file;
        }
        if let Some(url_base) = self.url_base {
            config.url_base = url_base;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(db_path) = self.db_path {
            config.db_path = db_path;
        }
        if let Some(log_file) = self.log_file {
            config.log_file = Some(log_file);
        }
        if let Some(pid_file) = self.pid_file {
            config.pid_file = pid_file;
        }
        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }
        config.log_level = self.log_level;
        config.log_format = self.log_format;

        config.validate()?;
        Ok(config)
    }

    /// Pid file to signal for `-s`: the flag, else the config file's `pid`
    /// key, else the default.
    pub fn control_pid_file(&self) -> Result<PathBuf, InitializationError> {
        if let Some(pid_file) = &self.pid_file {
            return Ok(pid_file.clone());
        }
        let mut config = Config::default();
        if let Some(path) = self.config_path() {
            config.apply_file(FileConfig::load(&path)?);
        }
        Ok(config.pid_file)
    }
}

fn resolve(prefix: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        prefix.join(path)
    }
}
