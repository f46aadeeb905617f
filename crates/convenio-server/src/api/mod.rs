//! HTTP request handlers

pub mod calculate;
pub mod chat;
pub mod meta;
pub mod search;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

/// Error body returned by every failing handler
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}

pub fn internal_error(error: impl std::fmt::Display) -> ApiError {
    tracing::error!("request failed: {}", error);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}
