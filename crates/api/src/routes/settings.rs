//! Catalog settings routes.

use axum::{extract::State, Json};
use serde_json::Value;
use validator::Validate;

use domain::models::setting::{UpdateThemeRequest, DEFAULT_THEME, THEME_KEY};
use domain::models::ThemeSetting;

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/settings/theme
pub async fn get_theme(State(state): State<AppState>) -> Result<Json<ThemeSetting>, ApiError> {
    let theme = state
        .settings
        .get(THEME_KEY)
        .await?
        .and_then(|setting| theme_from_value(&setting.value))
        .unwrap_or_else(|| DEFAULT_THEME.to_string());

    Ok(Json(ThemeSetting { theme }))
}

/// PUT /api/admin/settings/theme
pub async fn update_theme(
    State(state): State<AppState>,
    Json(request): Json<UpdateThemeRequest>,
) -> Result<Json<ThemeSetting>, ApiError> {
    request.validate()?;
    let theme = request.theme.trim().to_string();

    state
        .settings
        .put(THEME_KEY, Value::String(theme.clone()))
        .await?;
    tracing::info!(theme = %theme, "Theme updated");

    Ok(Json(ThemeSetting { theme }))
}

/// Stored themes are JSON strings; anything else falls back to the default.
fn theme_from_value(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
