// storage/migrations.rs
// Database migration management

use sqlx::migrate::Migrator;
use sqlx::{Pool, Sqlite};

/// Migrations from `migrations/`, embedded at build time.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Applies any pending migrations.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), anyhow::Error> {
    MIGRATOR.run(pool).await?;
    log::debug!("Applied {} embedded migration(s)", MIGRATOR.iter().count());
    Ok(())
}
