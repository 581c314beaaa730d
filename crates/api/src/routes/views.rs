//! View tracking route.

use axum::{extract::State, Json};

use domain::models::view::TrackViewResponse;
use domain::models::TrackViewRequest;

use crate::app::AppState;
use crate::error::ApiError;

/// POST /api/views
///
/// Succeeds once the view is stored, whether or not the bound recipient
/// could be notified.
pub async fn track_view(
    State(state): State<AppState>,
    Json(request): Json<TrackViewRequest>,
) -> Result<Json<TrackViewResponse>, ApiError> {
    state.lifecycle.track_view(request).await?;
    Ok(Json(TrackViewResponse { success: true }))
}
