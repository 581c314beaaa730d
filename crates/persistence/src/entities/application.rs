//! Application entity (database row mapping).

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::ApplicationStatus;
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for application_status that maps to the PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "lowercase")]
pub enum ApplicationStatusDb {
    Pending,
    Published,
    Rejected,
}

impl From<ApplicationStatusDb> for ApplicationStatus {
    fn from(status: ApplicationStatusDb) -> Self {
        match status {
            ApplicationStatusDb::Pending => ApplicationStatus::Pending,
            ApplicationStatusDb::Published => ApplicationStatus::Published,
            ApplicationStatusDb::Rejected => ApplicationStatus::Rejected,
        }
    }
}

impl From<ApplicationStatus> for ApplicationStatusDb {
    fn from(status: ApplicationStatus) -> Self {
        match status {
            ApplicationStatus::Pending => ApplicationStatusDb::Pending,
            ApplicationStatus::Published => ApplicationStatusDb::Published,
            ApplicationStatus::Rejected => ApplicationStatusDb::Rejected,
        }
    }
}

/// Database row mapping for the applications table.
#[derive(Debug, Clone, FromRow)]
pub struct ApplicationEntity {
    pub id: Uuid,
    pub category: String,
    pub name: String,
    pub description: String,
    pub description_en: Option<String>,
    pub logo_url: Option<String>,
    pub manager_username: String,
    pub contact_link: String,
    pub status: ApplicationStatusDb,
    pub publish_start: Option<NaiveDate>,
    pub publish_end: Option<NaiveDate>,
    pub registration_code: Option<String>,
    pub bound_recipient_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ApplicationEntity> for domain::models::Application {
    fn from(entity: ApplicationEntity) -> Self {
        Self {
            id: entity.id,
            category: entity.category,
            name: entity.name,
            description: entity.description,
            description_en: entity.description_en,
            logo_url: entity.logo_url,
            manager_username: entity.manager_username,
            contact_link: entity.contact_link,
            status: entity.status.into(),
            publish_start: entity.publish_start,
            publish_end: entity.publish_end,
            registration_code: entity.registration_code,
            bound_recipient_id: entity.bound_recipient_id,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
