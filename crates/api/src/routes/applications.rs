//! Application submission and admin review routes.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use domain::models::application::{
    ListApplicationsQuery, ReviewResponse, SubmitApplicationResponse,
};
use domain::models::{Application, ApplicationPatch, ReviewDecision, SubmitApplicationRequest};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::AdminIdentity;

/// POST /api/applications
///
/// Creates a pending application and announces it to the admins.
pub async fn submit_application(
    State(state): State<AppState>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Result<Json<SubmitApplicationResponse>, ApiError> {
    let application = state.lifecycle.submit(request).await?;

    Ok(Json(SubmitApplicationResponse {
        success: true,
        application_id: application.id,
    }))
}

/// GET /api/admin/applications?status=pending
pub async fn list_applications(
    State(state): State<AppState>,
    Query(query): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<Application>>, ApiError> {
    let applications = state
        .lifecycle
        .list_for_review(query.status.as_deref())
        .await?;
    Ok(Json(applications))
}

/// POST /api/admin/applications/review
///
/// Approving publishes the application and returns its registration code.
pub async fn review_application(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Json(decision): Json<ReviewDecision>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let approved = decision.approved;
    let outcome = state.lifecycle.review(decision).await?;

    tracing::info!(
        admin = %admin.subject,
        application_id = %outcome.application.id,
        approved,
        status = %outcome.application.status,
        "Admin reviewed application"
    );

    Ok(Json(ReviewResponse {
        success: true,
        status: outcome.application.status,
        notify_code: outcome.notify_code,
    }))
}

/// PUT /api/admin/applications/:id
pub async fn update_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<ApplicationPatch>,
) -> Result<Json<Application>, ApiError> {
    let application = state.lifecycle.update(id, patch).await?;
    Ok(Json(application))
}

/// DELETE /api/admin/applications/:id
pub async fn delete_application(
    State(state): State<AppState>,
    Extension(admin): Extension<AdminIdentity>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.lifecycle.delete(id).await?;
    tracing::info!(admin = %admin.subject, application_id = %id, "Admin deleted application");
    Ok(StatusCode::NO_CONTENT)
}
