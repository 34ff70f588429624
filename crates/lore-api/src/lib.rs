//! Lore API - HTTP server
//!
//! Exposes the RAG pipeline over HTTP: file ingestion, single-document
//! insertion and question answering, plus health probes and the OpenAPI
//! document.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use lore_core::LoggingConfig;
use state::AppState;
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

/// OpenAPI document for the service
#[derive(OpenApi)]
#[openapi(
    info(title = "Lore API", description = "Paragraph RAG over a vector store"),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::ingest::ingest_file,
        handlers::documents::add_doc,
        handlers::query::rag,
    ),
    components(schemas(
        error::ApiError,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::ReadinessChecks,
        handlers::ingest::IngestFileRequest,
        handlers::ingest::IngestFileResponse,
        handlers::documents::AddDocRequest,
        handlers::documents::StatusResponse,
        handlers::query::RagRequest,
        handlers::query::RagResponse,
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "ingest", description = "Document ingestion"),
        (name = "documents", description = "Single document insertion"),
        (name = "query", description = "Retrieval-augmented answers"),
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Build the application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::api_routes())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Empty origin list allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("{},tower_http=debug", config.level).into()
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_endpoints() {
        let doc = ApiDoc::openapi();
        for path in ["/health", "/ready", "/ingest_file", "/add_doc", "/rag"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
