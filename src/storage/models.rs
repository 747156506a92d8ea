// storage/models.rs
// Database models and types

use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::lookup::GeoRecord;

/// One row of the `ip_warehouse` table.
///
/// Bounds are stored twice: as integers for range queries and as dotted-quad
/// text for people reading the table directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRange {
    pub record: GeoRecord,
    pub start_ip: i64,
    pub end_ip: i64,
    pub start_ip_text: String,
    pub end_ip_text: String,
}

impl StoredRange {
    pub(crate) fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(StoredRange {
            record: GeoRecord {
                country: row.try_get("country")?,
                country_id: row.try_get("country_id")?,
                area: row.try_get("area")?,
                area_id: row.try_get("area_id")?,
                region: row.try_get("region")?,
                region_id: row.try_get("region_id")?,
                city: row.try_get("city")?,
                city_id: row.try_get("city_id")?,
                isp: row.try_get("isp")?,
                isp_id: row.try_get("isp_id")?,
            },
            start_ip: row.try_get("start_ip")?,
            end_ip: row.try_get("end_ip")?,
            start_ip_text: row.try_get("start_ip_text")?,
            end_ip_text: row.try_get("end_ip_text")?,
        })
    }
}
