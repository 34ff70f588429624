//! API route definitions
//!
//! Author: Lore Contributors

use crate::handlers::{documents, health, ingest, query};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Pipeline routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ingest_file", post(ingest::ingest_file))
        .route("/add_doc", post(documents::add_doc))
        .route("/rag", post(query::rag))
}

/// Liveness and readiness probes
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
}
