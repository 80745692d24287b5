//! Conversion API for bank statement PDFs
//!
//! Exposes the statement engine over HTTP:
//! - `POST /convert`: multipart upload, answers with the ledger as CSV
//! - `GET /stats`: per-day usage counters (admin bearer token)
//! - `GET /`, `/health`, `/version`: liveness and build info

pub mod config;
pub mod error;
pub mod handlers;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::{AppState, UsageCounters, UsageSnapshot};

/// Room for the non-file multipart fields and boundaries
const FORM_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn router(state: Arc<AppState>) -> Router {
    // CORS configuration for web clients
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config.max_upload_bytes + FORM_OVERHEAD_BYTES;

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/version", get(handlers::version))
        .route("/stats", get(handlers::stats))
        .route("/convert", post(handlers::convert))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
