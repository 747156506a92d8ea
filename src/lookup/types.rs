//! Geolocation data structures.
//!
//! This module defines the record attached to every resolved range, the typed
//! schema of the lookup service response and the decoding between the two.

use serde::Deserialize;

use crate::config::{EMPTY_FIELD_PLACEHOLDER, UNSUBDIVIDED_COUNTRY_IDS};
use crate::error_handling::LookupError;

/// Geolocation and ownership attributes of one address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoRecord {
    pub country: String,
    pub country_id: String,
    pub area: String,
    pub area_id: i64,
    pub region: String,
    pub region_id: i64,
    pub city: String,
    pub city_id: i64,
    pub isp: String,
    pub isp_id: i64,
}

impl GeoRecord {
    /// Returns `true` when two records belong to the same range.
    ///
    /// Country ids must match. For territories the service does not subdivide
    /// (HK, TW, MO) that is sufficient; everywhere else the area, region,
    /// city and ISP ids must match as well. Names are not compared.
    pub fn same_range(&self, other: &GeoRecord) -> bool {
        if self.country_id != other.country_id {
            return false;
        }
        if UNSUBDIVIDED_COUNTRY_IDS.contains(&self.country_id.as_str()) {
            return true;
        }
        self.region_id == other.region_id
            && self.area_id == other.area_id
            && self.city_id == other.city_id
            && self.isp_id == other.isp_id
    }
}

/// Envelope returned by the lookup service.
///
/// Only `data` is required. When the service rejects an address it usually
/// sends `data` as a plain string, which fails to decode as [`RawGeoData`].
#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    #[serde(default)]
    pub code: Option<i64>,
    pub data: RawGeoData,
}

/// The nested `data` object. Every value is a string on the wire.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RawGeoData {
    pub country: String,
    pub country_id: String,
    pub area: String,
    pub area_id: String,
    pub region: String,
    pub region_id: String,
    pub city: String,
    pub city_id: String,
    pub isp: String,
    pub isp_id: String,
}

fn or_placeholder(value: String) -> String {
    if value.is_empty() {
        EMPTY_FIELD_PLACEHOLDER.to_string()
    } else {
        value
    }
}

fn parse_id(value: &str) -> i64 {
    value.trim().parse().unwrap_or(0)
}

impl From<RawGeoData> for GeoRecord {
    fn from(raw: RawGeoData) -> Self {
        GeoRecord {
            area_id: parse_id(&raw.area_id),
            region_id: parse_id(&raw.region_id),
            city_id: parse_id(&raw.city_id),
            isp_id: parse_id(&raw.isp_id),
            country: or_placeholder(raw.country),
            country_id: or_placeholder(raw.country_id),
            area: or_placeholder(raw.area),
            region: or_placeholder(raw.region),
            city: or_placeholder(raw.city),
            isp: or_placeholder(raw.isp),
        }
    }
}

/// Decodes a response body into a [`GeoRecord`].
///
/// # Errors
///
/// Returns [`LookupError::Decode`] if the body is not JSON, has no `data`
/// object, or any known field inside `data` is not a string.
pub fn decode_lookup_body(body: &[u8]) -> Result<GeoRecord, LookupError> {
    let response: LookupResponse =
        serde_json::from_slice(body).map_err(|e| LookupError::Decode(e.to_string()))?;
    if let Some(code) = response.code {
        if code != 0 {
            log::debug!("Lookup response carried non-zero code {}", code);
        }
    }
    Ok(GeoRecord::from(response.data))
}

#[cfg(test)]
pub(crate) fn test_record(country_id: &str, region_id: i64, city_id: i64) -> GeoRecord {
    GeoRecord {
        country: format!("country-{country_id}"),
        country_id: country_id.to_string(),
        area: "-".to_string(),
        area_id: 0,
        region: format!("region-{region_id}"),
        region_id,
        city: format!("city-{city_id}"),
        city_id,
        isp: "isp".to_string(),
        isp_id: 100017,
    }
}
