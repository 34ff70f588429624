//! Lore API Server
//!
//! REST API server for the Lore paragraph RAG pipeline.
//!
//! Author: Lore Contributors

use lore_api::{create_router, init_tracing, shutdown_signal, state::AppState};
use lore_core::config::AppConfig;
use lore_rag::{create_llm_client, RagPipeline};
use lore_vector::{create_embedding_client, create_vector_store};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    init_tracing(&config.logging);

    if config.llm.api_key.is_none() {
        tracing::warn!("LLM_API_KEY is not set; embedding and chat requests will fail");
    }

    // Build the pipeline
    let store = create_vector_store(&config.store).await?;
    let embedder = create_embedding_client(&config)?;
    let llm = create_llm_client(&config)?;
    let pipeline = Arc::new(RagPipeline::new(embedder, store, llm, config.rag.clone()));

    let addr = format!("{}:{}", config.server.host, config.server.port);

    // Create application state
    let state = Arc::new(AppState::new(config, pipeline));

    // Create router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Lore API Server starting on http://{}", addr);
    tracing::info!("OpenAPI spec at http://{}/api-docs/openapi.json", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
