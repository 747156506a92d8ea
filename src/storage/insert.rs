//! Database insert operations.
//!
//! Every resolved range becomes one row. Inserts use parameterized queries.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;
use crate::resolver::ResolvedRange;

/// Destination for resolved ranges.
///
/// Callers treat an `Err` as a lost row, never as a reason to stop resolving.
#[async_trait]
pub trait RangeSink: Send + Sync {
    async fn save(&self, range: &ResolvedRange) -> Result<(), DatabaseError>;
}

/// Writes ranges to the `ip_warehouse` table.
#[derive(Clone)]
pub struct SqliteRangeSink {
    pool: SqlitePool,
}

impl SqliteRangeSink {
    pub fn new(pool: SqlitePool) -> Self {
        SqliteRangeSink { pool }
    }
}

#[async_trait]
impl RangeSink for SqliteRangeSink {
    async fn save(&self, range: &ResolvedRange) -> Result<(), DatabaseError> {
        insert_range(&self.pool, range).await
    }
}

/// Inserts a single range.
pub async fn insert_range(pool: &SqlitePool, range: &ResolvedRange) -> Result<(), DatabaseError> {
    let record = &range.record;
    sqlx::query(
        "INSERT INTO ip_warehouse (
            country, country_id, area, area_id, region, region_id,
            city, city_id, isp, isp_id,
            start_ip, end_ip, start_ip_text, end_ip_text
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&record.country)
    .bind(&record.country_id)
    .bind(&record.area)
    .bind(record.area_id)
    .bind(&record.region)
    .bind(record.region_id)
    .bind(&record.city)
    .bind(record.city_id)
    .bind(&record.isp)
    .bind(record.isp_id)
    .bind(i64::from(range.start))
    .bind(i64::from(range.end))
    .bind(range.start.to_string())
    .bind(range.end.to_string())
    .execute(pool)
    .await?;
    Ok(())
}
