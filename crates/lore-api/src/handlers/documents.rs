//! Single-document handler
//!
//! Author: Lore Contributors

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Add-document request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddDocRequest {
    /// Raw text, stored as one chunk
    #[schema(example = "The library opens at 9am on weekdays.")]
    pub text: String,
}

/// Generic status response
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Embed and store one document without splitting it
#[utoipa::path(
    post,
    path = "/add_doc",
    tag = "documents",
    request_body = AddDocRequest,
    responses(
        (status = 200, description = "Document stored", body = StatusResponse),
        (status = 400, description = "Empty text", body = crate::error::ApiError),
        (status = 500, description = "Embedding or storage failed", body = crate::error::ApiError)
    )
)]
pub async fn add_doc(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddDocRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    state.pipeline.add_document(&req.text).await?;

    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}
