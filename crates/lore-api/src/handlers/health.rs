//! Health check handlers
//!
//! Author: Lore Contributors

use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub name: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_secs(),
    })
}

/// Readiness response
#[derive(Serialize, ToSchema)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub checks: ReadinessChecks,
}

#[derive(Serialize, ToSchema)]
pub struct ReadinessChecks {
    /// Active vector backend
    #[schema(example = "qdrant")]
    pub vector_store: String,
    /// Whether an API key is configured for the embedding and chat APIs
    pub llm_configured: bool,
    pub total_requests: u64,
}

/// Readiness probe
///
/// The store and clients are built before the server binds, so a running
/// server is ready; the checks report what it is wired to.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "health",
    responses(
        (status = 200, description = "Service is ready", body = ReadinessResponse)
    )
)]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(ReadinessResponse {
        ready: true,
        checks: ReadinessChecks {
            vector_store: state.pipeline.store_name().to_string(),
            llm_configured: state.pipeline.llm_configured(),
            total_requests: state.get_request_count(),
        },
    })
}
