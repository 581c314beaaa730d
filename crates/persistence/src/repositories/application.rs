//! Application repository for database operations.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use domain::models::{
    Application, ApplicationPatch, ApplicationStatus, NewApplication, PublishWindow,
};
use domain::services::{ApplicationStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use super::store_error;
use crate::entities::{ApplicationEntity, ApplicationStatusDb};
use crate::metrics::QueryTimer;

/// Repository for application records.
#[derive(Clone)]
pub struct ApplicationRepository {
    pool: PgPool,
}

impl ApplicationRepository {
    /// Creates a new ApplicationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl ApplicationStore for ApplicationRepository {
    async fn insert(&self, new: NewApplication) -> Result<Application, StoreError> {
        let timer = QueryTimer::new("insert_application");
        let now = Utc::now();
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            INSERT INTO applications (category, name, description, description_en, logo_url,
                                      manager_username, contact_link, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending', $8, $8)
            RETURNING id, category, name, description, description_en, logo_url, manager_username,
                      contact_link, status, publish_start, publish_end, registration_code,
                      bound_recipient_id, created_at, updated_at
            "#,
        )
        .bind(&new.category)
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.description_en)
        .bind(&new.logo_url)
        .bind(&new.manager_username)
        .bind(&new.contact_link)
        .bind(now)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result.map(Into::into).map_err(store_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        let timer = QueryTimer::new("find_application_by_id");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            SELECT id, category, name, description, description_en, logo_url, manager_username,
                   contact_link, status, publish_start, publish_end, registration_code,
                   bound_recipient_id, created_at, updated_at
            FROM applications
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Application>, StoreError> {
        let timer = QueryTimer::new("find_application_by_code");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            SELECT id, category, name, description, description_en, logo_url, manager_username,
                   contact_link, status, publish_start, publish_end, registration_code,
                   bound_recipient_id, created_at, updated_at
            FROM applications
            WHERE registration_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn list_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>, StoreError> {
        let timer = QueryTimer::new("list_applications_by_status");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            SELECT id, category, name, description, description_en, logo_url, manager_username,
                   contact_link, status, publish_start, publish_end, registration_code,
                   bound_recipient_id, created_at, updated_at
            FROM applications
            WHERE status = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(ApplicationStatusDb::from(status))
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn list_live(
        &self,
        category: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<Application>, StoreError> {
        let timer = QueryTimer::new("list_live_applications");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            SELECT id, category, name, description, description_en, logo_url, manager_username,
                   contact_link, status, publish_start, publish_end, registration_code,
                   bound_recipient_id, created_at, updated_at
            FROM applications
            WHERE status = 'published'
              AND ($1::TEXT IS NULL OR category = $1)
              AND (publish_start IS NULL OR publish_start <= $2)
              AND (publish_end IS NULL OR publish_end >= $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(category)
        .bind(today)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result
            .map(|rows| rows.into_iter().map(Into::into).collect())
            .map_err(store_error)
    }

    async fn publish(
        &self,
        id: Uuid,
        candidate_code: Option<&str>,
        window: PublishWindow,
    ) -> Result<Option<Application>, StoreError> {
        let timer = QueryTimer::new("publish_application");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            UPDATE applications
            SET status = 'published',
                registration_code = COALESCE(registration_code, $2),
                publish_start = $3,
                publish_end = $4,
                updated_at = $5
            WHERE id = $1 AND status IN ('pending', 'published')
            RETURNING id, category, name, description, description_en, logo_url, manager_username,
                      contact_link, status, publish_start, publish_end, registration_code,
                      bound_recipient_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(candidate_code)
        .bind(window.start)
        .bind(window.end)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn reject(&self, id: Uuid) -> Result<Option<Application>, StoreError> {
        let timer = QueryTimer::new("reject_application");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            UPDATE applications
            SET status = 'rejected', updated_at = $2
            WHERE id = $1 AND status = 'pending'
            RETURNING id, category, name, description, description_en, logo_url, manager_username,
                      contact_link, status, publish_start, publish_end, registration_code,
                      bound_recipient_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn update(
        &self,
        id: Uuid,
        patch: &ApplicationPatch,
    ) -> Result<Option<Application>, StoreError> {
        let timer = QueryTimer::new("update_application");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            UPDATE applications
            SET category = COALESCE($2, category),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                description_en = CASE WHEN $5 THEN $6 ELSE description_en END,
                logo_url = CASE WHEN $7 THEN $8 ELSE logo_url END,
                manager_username = COALESCE($9, manager_username),
                contact_link = COALESCE($10, contact_link),
                publish_start = CASE WHEN $11 THEN $12 ELSE publish_start END,
                publish_end = CASE WHEN $13 THEN $14 ELSE publish_end END,
                updated_at = $15
            WHERE id = $1
            RETURNING id, category, name, description, description_en, logo_url, manager_username,
                      contact_link, status, publish_start, publish_end, registration_code,
                      bound_recipient_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&patch.category)
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(patch.description_en.is_some())
        .bind(patch.description_en.clone().flatten())
        .bind(patch.logo_url.is_some())
        .bind(patch.logo_url.clone().flatten())
        .bind(&patch.manager_username)
        .bind(&patch.contact_link)
        .bind(patch.publish_start.is_some())
        .bind(patch.publish_start.flatten())
        .bind(patch.publish_end.is_some())
        .bind(patch.publish_end.flatten())
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let timer = QueryTimer::new("delete_application");
        let result = sqlx::query("DELETE FROM applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await;
        timer.finish(&result);
        result
            .map(|done| done.rows_affected() > 0)
            .map_err(store_error)
    }

    async fn bind_recipient(
        &self,
        code: &str,
        recipient_id: &str,
    ) -> Result<Option<Application>, StoreError> {
        let timer = QueryTimer::new("bind_application_recipient");
        let result = sqlx::query_as::<_, ApplicationEntity>(
            r#"
            UPDATE applications
            SET bound_recipient_id = $2, updated_at = $3
            WHERE registration_code = $1
              AND status = 'published'
              AND bound_recipient_id IS NULL
            RETURNING id, category, name, description, description_en, logo_url, manager_username,
                      contact_link, status, publish_start, publish_end, registration_code,
                      bound_recipient_id, created_at, updated_at
            "#,
        )
        .bind(code)
        .bind(recipient_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result.map(|row| row.map(Into::into)).map_err(store_error)
    }
}
