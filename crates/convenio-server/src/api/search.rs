//! Semantic search endpoint

use super::{internal_error, ApiError};
use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: String,
    pub company: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchItem {
    pub id: i64,
    pub content: String,
    pub article_ref: Option<String>,
    pub document_title: String,
    pub company: String,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchItem>,
}

/// GET /search?q=&company= - vector-ranked fragment projection
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.trim();
    if query.is_empty() {
        return Err(super::bad_request("q is required"));
    }
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);

    // Embed before taking the store lock; the lock is only held for the
    // synchronous ranking pass
    let embedding = state.vector.embed_query(query).await.map_err(internal_error)?;
    let db = state.db.lock().await;
    let scored = state
        .vector
        .rank(&db, &embedding, params.company.as_deref(), limit)
        .map_err(internal_error)?;

    let results = scored
        .into_iter()
        .map(|item| SearchItem {
            id: item.fragment.id,
            content: item.fragment.content,
            article_ref: item.fragment.article_ref,
            document_title: item.fragment.document_title,
            company: item.fragment.metadata.company,
            score: item.score,
        })
        .collect();

    Ok(Json(SearchResponse { results }))
}
