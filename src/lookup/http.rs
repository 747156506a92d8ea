//! HTTP implementation of the lookup service client.
//!
//! One GET per address: `{base_url}{dotted-quad}`. A single call makes exactly
//! one request; retries live in [`super::RetryingLookup`].

use std::error::Error as StdError;
use std::io::ErrorKind;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;

use super::types::{decode_lookup_body, GeoRecord};
use super::GeoLookup;
use crate::address::Address;
use crate::error_handling::LookupError;

/// Lookup client backed by the remote geolocation service.
pub struct HttpGeoApi {
    client: Arc<reqwest::Client>,
    base_url: String,
}

impl HttpGeoApi {
    /// Creates a client for `base_url`.
    ///
    /// The client should already carry the timeout and User-Agent; see
    /// [`crate::initialization::init_client`].
    pub fn new(client: Arc<reqwest::Client>, base_url: impl Into<String>) -> Self {
        HttpGeoApi {
            client,
            base_url: base_url.into(),
        }
    }

    /// Full request URL for one address.
    pub fn url_for(&self, address: Address) -> String {
        format!("{}{}", self.base_url, address)
    }
}

#[async_trait]
impl GeoLookup for HttpGeoApi {
    async fn lookup(&self, address: Address) -> Result<GeoRecord, LookupError> {
        let url = self.url_for(address);
        log::debug!("Querying {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_request_error)?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            return Err(LookupError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(classify_request_error)?;
        log::trace!("Lookup body for {}: {}", address, String::from_utf8_lossy(&body));
        decode_lookup_body(&body)
    }
}

/// Maps a `reqwest::Error` onto the lookup taxonomy.
///
/// Connection-level failures (refused, reset, aborted, timed out) are
/// transient; everything else abandons the address.
pub(crate) fn classify_request_error(error: reqwest::Error) -> LookupError {
    if error.is_timeout() || error.is_connect() || error.is_request() || is_connection_reset(&error)
    {
        LookupError::Transient(error.to_string())
    } else {
        LookupError::Request(error.to_string())
    }
}

fn is_connection_reset(error: &(dyn StdError + 'static)) -> bool {
    let mut source = Some(error);
    while let Some(cause) = source {
        if let Some(io_error) = cause.downcast_ref::<std::io::Error>() {
            if matches!(
                io_error.kind(),
                ErrorKind::ConnectionReset
                    | ErrorKind::ConnectionAborted
                    | ErrorKind::BrokenPipe
                    | ErrorKind::UnexpectedEof
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
