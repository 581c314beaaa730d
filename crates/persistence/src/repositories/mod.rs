//! Repository implementations for database operations.

pub mod application;
pub mod setting;
pub mod view;

pub use application::ApplicationRepository;
pub use setting::SettingRepository;
pub use view::ViewRepository;

use domain::services::StoreError;

/// PostgreSQL unique_violation.
const UNIQUE_VIOLATION: &str = "23505";
const REGISTRATION_CODE_CONSTRAINT: &str = "applications_registration_code_key";

/// Maps a sqlx error into the domain store error.
pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION)
            && db_err.constraint() == Some(REGISTRATION_CODE_CONSTRAINT)
        {
            return StoreError::CodeCollision;
        }
    }
    tracing::error!(error = %err, "Database query failed");
    StoreError::Backend(err.to_string())
}
