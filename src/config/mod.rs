//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (defaults, timeouts, retry parameters)
//! - The JSON config file schema
//! - CLI option types and parsing

mod constants;
mod file;
mod types;

// Re-export all constants
pub use constants::*;
pub use file::FileConfig;
pub use types::{Config, ControlSignal, LogFormat, LogLevel, Opt};
