//! Application view repository for database operations.

use async_trait::async_trait;
use domain::models::{ApplicationView, NewView};
use domain::services::{StoreError, ViewStore};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::ApplicationViewEntity;
use crate::metrics::QueryTimer;

/// Repository for the append-only view log.
#[derive(Clone)]
pub struct ViewRepository {
    pool: PgPool,
}

impl ViewRepository {
    /// Creates a new ViewRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of recorded views for an application.
    pub async fn count_for_application(&self, application_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_application_views");
        let result: Result<(i64,), sqlx::Error> = sqlx::query_as(
            r#"
            SELECT COUNT(*) as count
            FROM application_views
            WHERE application_id = $1
            "#,
        )
        .bind(application_id)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.0)
    }
}

#[async_trait]
impl ViewStore for ViewRepository {
    async fn record_view(&self, view: NewView) -> Result<ApplicationView, StoreError> {
        let timer = QueryTimer::new("record_application_view");
        let result = sqlx::query_as::<_, ApplicationViewEntity>(
            r#"
            INSERT INTO application_views (application_id, viewer_id, viewer_username)
            VALUES ($1, $2, $3)
            RETURNING id, application_id, viewer_id, viewer_username, viewed_at
            "#,
        )
        .bind(view.application_id)
        .bind(&view.viewer_id)
        .bind(&view.viewer_username)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map(Into::into).map_err(store_error)
    }
}
