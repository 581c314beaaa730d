//! Key/value setting repository for database operations.

use sqlx::PgPool;

use crate::entities::AppSettingEntity;
use crate::metrics::QueryTimer;

/// Repository for the app_settings table.
#[derive(Clone)]
pub struct SettingRepository {
    pool: PgPool,
}

impl SettingRepository {
    /// Creates a new SettingRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a setting by key.
    pub async fn get(&self, key: &str) -> Result<Option<AppSettingEntity>, sqlx::Error> {
        let timer = QueryTimer::new("get_app_setting");
        let result = sqlx::query_as::<_, AppSettingEntity>(
            r#"
            SELECT key, value, updated_at
            FROM app_settings
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Insert or replace a setting value.
    pub async fn put(
        &self,
        key: &str,
        value: serde_json::Value,
    ) -> Result<AppSettingEntity, sqlx::Error> {
        let timer = QueryTimer::new("put_app_setting");
        let result = sqlx::query_as::<_, AppSettingEntity>(
            r#"
            INSERT INTO app_settings (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = EXCLUDED.updated_at
            RETURNING key, value, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}
