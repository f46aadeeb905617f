//! Metadata projections over the salary and concept stores

use super::{internal_error, ApiError};
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::Json;
use convenio_core::VariableConceptDefinition;
use serde::Deserialize;

/// GET /companies
pub async fn companies(
    State(state): State<AppState>,
) -> Result<Json<Vec<String>>, ApiError> {
    let db = state.db.lock().await;
    let companies = db.list_companies().map_err(internal_error)?;
    Ok(Json(companies))
}

/// GET /companies/{slug}/groups
pub async fn groups(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<String>>, ApiError> {
    let db = state.db.lock().await;
    let groups = db.list_groups(&slug).map_err(internal_error)?;
    Ok(Json(groups))
}

#[derive(Debug, Deserialize)]
pub struct LevelParams {
    pub group: Option<String>,
}

/// GET /companies/{slug}/levels?group=
pub async fn levels(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(params): Query<LevelParams>,
) -> Result<Json<Vec<String>>, ApiError> {
    let db = state.db.lock().await;
    let levels = db
        .list_levels(&slug, params.group.as_deref())
        .map_err(internal_error)?;
    Ok(Json(levels))
}

/// GET /companies/{slug}/concepts
pub async fn concepts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<VariableConceptDefinition>>, ApiError> {
    let db = state.db.lock().await;
    let definitions = db.concept_definitions(&slug).map_err(internal_error)?;
    let mut list: Vec<VariableConceptDefinition> = definitions.into_values().collect();
    list.sort_by(|a, b| a.code.cmp(&b.code));
    Ok(Json(list))
}
