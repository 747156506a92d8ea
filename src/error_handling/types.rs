//! Error type definitions.
//!
//! This module defines all error types and failure categories used throughout
//! the application.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the logger with custom message (e.g., file creation).
    #[error("Logger initialization error: {0}")]
    LoggerSetupError(String),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// Error reading or decoding the configuration file.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Error types for database operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error creating the database file.
    #[error("Database file creation error: {0}")]
    FileCreationError(String),

    /// SQL execution error.
    #[error("SQL error: {0}")]
    SqlError(#[from] sqlx::Error),
}

/// Errors produced while turning one input line into a segment.
///
/// These are local to the line: the line is skipped and reading continues.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// The line did not contain exactly four address-like tokens.
    #[error("Malformed segment: expected 4 tokens, found {found} in {line:?}")]
    MalformedSegment { line: String, found: usize },

    /// A token that should be a dotted-quad address is not one.
    #[error("Invalid IPv4 address: {0:?}")]
    InvalidAddress(String),

    /// The start address is greater than the end address.
    #[error("Inverted segment: start {start} is after end {end}")]
    InvertedRange { start: String, end: String },
}

/// Outcome classes of a failed lookup for one address.
///
/// Only [`LookupError::Transient`] is retried. Everything else abandons the
/// address point.
#[derive(Error, Debug)]
pub enum LookupError {
    /// Connection-level failure that may succeed on retry (reset, timeout).
    #[error("Transient network error: {0}")]
    Transient(String),

    /// Every allowed attempt failed with a transient error.
    #[error("Transient network error persisted after {attempts} attempts: {last}")]
    TransientExhausted { attempts: u32, last: String },

    /// The service answered with a status other than 200/206.
    #[error("Lookup service returned HTTP {0}")]
    Status(u16),

    /// The body was missing, not JSON, or lacked the expected `data` object.
    #[error("Failed to decode lookup response: {0}")]
    Decode(String),

    /// Any other request failure (invalid URL, builder error, body read failure).
    #[error("Lookup request failed: {0}")]
    Request(String),
}

impl LookupError {
    /// Returns `true` for failures that the retry policy should retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Transient(_))
    }

    /// Maps the error to its statistics bucket.
    pub fn kind(&self) -> FailureKind {
        match self {
            LookupError::Transient(_) | LookupError::TransientExhausted { .. } => {
                FailureKind::LookupTransientExhausted
            }
            LookupError::Status(_) => FailureKind::LookupStatus,
            LookupError::Decode(_) => FailureKind::LookupDecode,
            LookupError::Request(_) => FailureKind::LookupRequest,
        }
    }
}

/// Errors raised when talking to an already running collector.
#[derive(Error, Debug)]
pub enum ControlError {
    /// The pid file could not be read.
    #[error("Failed to read pid file {path}: {source}")]
    PidFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The pid file could not be written or removed.
    #[error("Failed to write pid file {path}: {source}")]
    PidFileWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The pid file did not contain a process id.
    #[error("Invalid pid in {path}: {content:?}")]
    InvalidPid { path: String, content: String },

    /// Another collector is already running.
    #[error("Collector already running with pid {0}")]
    AlreadyRunning(i32),

    /// The signal could not be delivered.
    #[error("Failed to send signal to pid {pid}: {reason}")]
    SignalDelivery { pid: i32, reason: String },
}

/// Failure categories counted per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    // Input errors
    MalformedSegment,
    InvalidAddress,
    InvertedRange,
    // Lookup errors
    LookupTransientExhausted,
    LookupStatus,
    LookupDecode,
    LookupRequest,
    // Storage errors
    StorageWrite,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::MalformedSegment => "Malformed segment line",
            FailureKind::InvalidAddress => "Invalid address in segment line",
            FailureKind::InvertedRange => "Inverted segment range",
            FailureKind::LookupTransientExhausted => "Lookup retries exhausted",
            FailureKind::LookupStatus => "Lookup HTTP status error",
            FailureKind::LookupDecode => "Lookup decode error",
            FailureKind::LookupRequest => "Lookup request error",
            FailureKind::StorageWrite => "Storage write error",
        }
    }
}

impl From<&SegmentError> for FailureKind {
    fn from(error: &SegmentError) -> Self {
        match error {
            SegmentError::MalformedSegment { .. } => FailureKind::MalformedSegment,
            SegmentError::InvalidAddress(_) => FailureKind::InvalidAddress,
            SegmentError::InvertedRange { .. } => FailureKind::InvertedRange,
        }
    }
}
