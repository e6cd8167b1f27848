//! Error types for the merge API
//!
//! Every failure is answered with 400 and `{"error": message}`; callers do
//! not distinguish bad input from a failing dependency.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use docmerge_core::MergeError;
use serde_json::json;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::InvalidRequest(msg) => tracing::debug!("Rejected request: {}", msg),
            ApiError::Store(e) => tracing::warn!("Store error: {}", e),
            ApiError::Merge(e) => tracing::warn!("Merge error: {}", e),
            ApiError::Internal(e) => tracing::error!("Internal error: {}", e),
        }

        let body = Json(json!({ "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
