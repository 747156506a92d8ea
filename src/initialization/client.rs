//! HTTP client initialization.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{LOOKUP_USER_AGENT, TCP_CONNECT_TIMEOUT_SECS};

/// Initializes the HTTP client shared by all lookup workers.
///
/// Creates a `reqwest::Client` configured with:
/// - the fixed lookup User-Agent
/// - a per-request timeout of `timeout_seconds`
/// - a TCP connect timeout capped at the request timeout
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout_seconds: u64) -> Result<Arc<reqwest::Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .timeout(Duration::from_secs(timeout_seconds))
        .connect_timeout(Duration::from_secs(
            TCP_CONNECT_TIMEOUT_SECS.min(timeout_seconds),
        ))
        .user_agent(LOOKUP_USER_AGENT)
        .build()?;
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_client() {
        assert!(init_client(10).is_ok());
        assert!(init_client(1).is_ok());
    }
}
