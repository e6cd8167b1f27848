//! DocMerge API - overlays signed form data onto template PDFs
//!
//! Provides REST endpoints for:
//! - Merging a submission into a template (`POST /merge-pdf`)
//! - Health checks

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod merge;
pub mod models;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;

/// Build the router with CORS and request tracing
pub fn app(state: AppState) -> Router {
    // Browsers call this directly from the signing page
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/merge-pdf", post(handlers::merge_pdf))
        .route("/functions/v1/merge-pdf", post(handlers::merge_pdf))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
