//! Read access to stored ranges.

use sqlx::SqlitePool;

use super::models::StoredRange;
use crate::error_handling::DatabaseError;

/// Returns every stored range ordered by start address.
pub async fn fetch_ranges(pool: &SqlitePool) -> Result<Vec<StoredRange>, DatabaseError> {
    let rows = sqlx::query(
        "SELECT country, country_id, area, area_id, region, region_id,
                city, city_id, isp, isp_id,
                start_ip, end_ip, start_ip_text, end_ip_text
         FROM ip_warehouse
         ORDER BY start_ip, end_ip",
    )
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| StoredRange::from_row(row).map_err(DatabaseError::from))
        .collect()
}

/// Number of stored rows.
pub async fn count_ranges(pool: &SqlitePool) -> Result<i64, DatabaseError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM ip_warehouse")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
