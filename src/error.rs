use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::normalize::NormalizeError;

/// Errors surfaced to API callers. All of them are the caller's fault and map
/// to `400 { ok: false, error }`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("URL missing")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] NormalizeError),

    #[error("Invalid request body: {0}")]
    BadBody(#[from] serde_json::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "ok": false, "error": self.to_string() }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
