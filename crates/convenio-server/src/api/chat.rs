//! Conversational endpoint

use super::{bad_request, ApiError};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use convenio_core::ChatResponse;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    pub company_slug: Option<String>,
    /// Previous user turn, for short follow-up queries
    pub previous_turn: Option<String>,
}

/// POST /chat - full retrieval + calculation + generation pipeline
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let query = req.query.trim();
    if query.is_empty() {
        return Err(bad_request("query is required"));
    }
    if let Some(slug) = req.company_slug.as_deref() {
        if !convenio_core::companies::is_valid_company(slug) {
            return Err(bad_request(format!("unknown company: {}", slug)));
        }
    }

    let response = state
        .pipeline
        .chat(
            &state.db,
            query,
            req.company_slug.as_deref(),
            req.previous_turn.as_deref(),
        )
        .await;

    Ok(Json(response))
}
