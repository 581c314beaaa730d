//! Key/value setting entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the app_settings table.
#[derive(Debug, Clone, FromRow)]
pub struct AppSettingEntity {
    pub key: String,
    pub value: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}
