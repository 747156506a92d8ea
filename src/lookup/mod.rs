//! Geolocation lookup client.
//!
//! This module provides:
//! - [`GeoRecord`] and the typed response schema of the lookup service
//! - [`GeoLookup`], the seam the range resolver queries through
//! - [`HttpGeoApi`], one HTTP request per address
//! - [`RetryingLookup`] / [`RetryPolicy`], exponential backoff for transient
//!   network failures

mod http;
mod retry;
mod types;

use std::sync::Arc;

use async_trait::async_trait;

pub use http::HttpGeoApi;
pub use retry::{RetryPolicy, RetryingLookup};
pub use types::{decode_lookup_body, GeoRecord, LookupResponse, RawGeoData};

#[cfg(test)]
pub(crate) use types::test_record;

use crate::address::Address;
use crate::error_handling::LookupError;

/// Resolves one address to its geolocation record.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, address: Address) -> Result<GeoRecord, LookupError>;
}

#[async_trait]
impl<L: GeoLookup + ?Sized> GeoLookup for Arc<L> {
    async fn lookup(&self, address: Address) -> Result<GeoRecord, LookupError> {
        (**self).lookup(address).await
    }
}

/// The production client: HTTP lookups with retry.
pub type LookupClient = RetryingLookup<HttpGeoApi>;

/// Builds the production lookup client.
pub fn build_lookup_client(
    client: Arc<reqwest::Client>,
    base_url: &str,
    policy: RetryPolicy,
) -> LookupClient {
    RetryingLookup::new(HttpGeoApi::new(client, base_url), policy)
}
