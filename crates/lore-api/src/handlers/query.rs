//! RAG query handler
//!
//! Author: Lore Contributors

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Query request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct RagRequest {
    /// User's question
    #[schema(example = "When does the library open?")]
    pub query: String,

    /// Number of passages to retrieve
    #[schema(example = 3)]
    pub top_k: Option<usize>,
}

/// Query response body
#[derive(Debug, Serialize, ToSchema)]
pub struct RagResponse {
    /// Generated answer
    #[schema(example = "The library opens at 9am on weekdays.")]
    pub answer: String,

    /// Passages the answer was generated from
    pub docs: Vec<String>,
}

/// Answer a question from the indexed documents
#[utoipa::path(
    post,
    path = "/rag",
    tag = "query",
    request_body = RagRequest,
    responses(
        (status = 200, description = "Query successful", body = RagResponse),
        (status = 400, description = "Invalid request", body = crate::error::ApiError),
        (status = 404, description = "No relevant documents", body = crate::error::ApiError),
        (status = 500, description = "Internal error", body = crate::error::ApiError)
    )
)]
pub async fn rag(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RagRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let start = std::time::Instant::now();
    let top_k = req.top_k.unwrap_or(state.pipeline.config().default_top_k);

    let result = state.pipeline.answer(&req.query, top_k).await?;

    tracing::info!(
        docs = result.docs.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Query answered"
    );

    Ok(Json(RagResponse {
        answer: result.answer,
        docs: result.docs,
    }))
}
