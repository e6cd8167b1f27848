//! HTTP handlers for the merge API

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::error::ApiError;
use crate::merge::merge_document;
use crate::models::{HealthResponse, MergeRequest, MergeResponse};
use crate::state::AppState;

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "docmerge-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Merge submitted values into a template and store the signed PDF
pub async fn merge_pdf(
    State(state): State<AppState>,
    body: Result<Json<MergeRequest>, JsonRejection>,
) -> Result<Json<MergeResponse>, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let (template_id, form_data) = req.validate()?;

    let path = merge_document(&state, &template_id, form_data).await?;
    Ok(Json(MergeResponse { path }))
}
