//! Public catalog routes.
//!
//! Only published applications inside their publish window are visible.
//! Everything else is reported exactly like an unknown id.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;

use domain::models::application::{CompanyDetailQuery, ListCompaniesQuery};
use domain::models::{Locale, PublicCompany};
use domain::services::ApplicationLifecycle;

use crate::app::AppState;
use crate::error::ApiError;

/// GET /api/companies?category=&locale=
pub async fn list_companies(
    State(state): State<AppState>,
    Query(query): Query<ListCompaniesQuery>,
) -> Result<Json<Vec<PublicCompany>>, ApiError> {
    let companies = state
        .lifecycle
        .list_public(
            query.category.as_deref(),
            Locale::from_query(query.locale.as_deref()),
            ApplicationLifecycle::today(),
        )
        .await?;
    Ok(Json(companies))
}

/// GET /api/companies/:id?locale=
pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<CompanyDetailQuery>,
) -> Result<Json<PublicCompany>, ApiError> {
    let company = state
        .lifecycle
        .get_public(
            id,
            Locale::from_query(query.locale.as_deref()),
            ApplicationLifecycle::today(),
        )
        .await?;
    Ok(Json(company))
}
