//! Connection pool and schema management for the catalog database.

use std::str::FromStr;
use std::time::Duration;

use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::PgPool;

use crate::metrics::{record_pool_metrics, QueryTimer};

/// Reported to PostgreSQL as `application_name` on every connection.
pub const APPLICATION_NAME: &str = "ofb-catalog";

static MIGRATOR: Migrator = sqlx::migrate!("src/migrations");

/// Pool bounds and timeouts.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// Connects the catalog pool and publishes its initial gauges.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.url)?.application_name(APPLICATION_NAME);

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect_with(options)
        .await?;

    record_pool_metrics(&pool);
    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Catalog database pool ready"
    );
    Ok(pool)
}

/// Applies the embedded migrations. Concurrent callers serialize on the
/// migrator's advisory lock.
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Round-trips `SELECT 1` and refreshes the pool gauges.
pub async fn ping(pool: &PgPool) -> Result<(), sqlx::Error> {
    let timer = QueryTimer::new("readiness_ping");
    let result = sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await;
    timer.finish(&result);
    record_pool_metrics(pool);
    result.map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_migrations_are_ordered() {
        let versions: Vec<i64> = MIGRATOR.iter().map(|m| m.version).collect();
        assert_eq!(versions, vec![1, 2, 3]);
    }
}
