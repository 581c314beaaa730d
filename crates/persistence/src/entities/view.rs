//! Application view entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the application_views table.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationViewEntity {
    pub id: i64,
    pub application_id: Uuid,
    pub viewer_id: String,
    pub viewer_username: String,
    pub viewed_at: DateTime<Utc>,
}

impl From<ApplicationViewEntity> for domain::models::ApplicationView {
    fn from(entity: ApplicationViewEntity) -> Self {
        Self {
            id: entity.id,
            application_id: entity.application_id,
            viewer_id: entity.viewer_id,
            viewer_username: entity.viewer_username,
            viewed_at: entity.viewed_at,
        }
    }
}
