//! Storage interfaces used by the lifecycle controller.
//!
//! The persistence crate implements these against PostgreSQL; tests use the
//! in-memory versions at the bottom of this module.

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Application, ApplicationPatch, ApplicationStatus, ApplicationView, NewApplication, NewView,
    PublishWindow,
};

/// Errors raised by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A candidate registration code is already held by another application.
    #[error("Registration code collision")]
    CodeCollision,

    #[error("Store failure: {0}")]
    Backend(String),
}

/// Durable application records.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Inserts a new application with status `pending`.
    async fn insert(&self, new: NewApplication) -> Result<Application, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Application>, StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Application>, StoreError>;

    /// Applications with the given status, newest first.
    async fn list_by_status(
        &self,
        status: ApplicationStatus,
    ) -> Result<Vec<Application>, StoreError>;

    /// Published applications whose window contains `today`, newest first.
    async fn list_live(
        &self,
        category: Option<&str>,
        today: NaiveDate,
    ) -> Result<Vec<Application>, StoreError>;

    /// Marks a pending or published application as published.
    ///
    /// An existing registration code is kept; `candidate_code` is only stored
    /// when the record has none. Returns `None` when the record is missing or
    /// rejected.
    async fn publish(
        &self,
        id: Uuid,
        candidate_code: Option<&str>,
        window: PublishWindow,
    ) -> Result<Option<Application>, StoreError>;

    /// Marks a pending application as rejected. Returns `None` when the record
    /// is missing or no longer pending.
    async fn reject(&self, id: Uuid) -> Result<Option<Application>, StoreError>;

    /// Applies the fields present in `patch`.
    async fn update(
        &self,
        id: Uuid,
        patch: &ApplicationPatch,
    ) -> Result<Option<Application>, StoreError>;

    /// Hard-deletes an application. Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Binds `recipient_id` to the published application holding `code`, but
    /// only while no recipient is bound yet. Returns `None` when nothing was
    /// claimable.
    async fn bind_recipient(
        &self,
        code: &str,
        recipient_id: &str,
    ) -> Result<Option<Application>, StoreError>;
}

/// Append-only view log.
#[async_trait]
pub trait ViewStore: Send + Sync {
    async fn record_view(&self, view: NewView) -> Result<ApplicationView, StoreError>;
}
