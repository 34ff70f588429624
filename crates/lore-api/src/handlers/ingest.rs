//! File ingestion handler
//!
//! Author: Lore Contributors

use crate::error::AppError;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Ingest-by-file request body
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestFileRequest {
    /// Path of a UTF-8 text file readable by the server
    #[schema(example = "data/handbook.md")]
    pub file_path: String,

    /// Fraction of words shared between neighbouring paragraphs, in [0, 1)
    #[schema(example = 0.2)]
    pub overlap_ratio: Option<f64>,
}

/// Ingest-by-file response body
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestFileResponse {
    #[schema(example = "ok")]
    pub status: String,
    #[schema(example = "done")]
    pub chunks: String,
}

/// Split a file into paragraph chunks and index them
#[utoipa::path(
    post,
    path = "/ingest_file",
    tag = "ingest",
    request_body = IngestFileRequest,
    responses(
        (status = 200, description = "File ingested", body = IngestFileResponse),
        (status = 400, description = "Invalid overlap ratio", body = crate::error::ApiError),
        (status = 500, description = "Ingestion failed", body = crate::error::ApiError)
    )
)]
pub async fn ingest_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IngestFileRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.increment_requests();

    let overlap_ratio = req
        .overlap_ratio
        .unwrap_or(state.pipeline.config().default_overlap_ratio);

    let report = state
        .pipeline
        .ingest_file(&req.file_path, overlap_ratio)
        .await?;

    tracing::info!(
        file = %req.file_path,
        paragraphs = report.paragraphs,
        inserted = report.inserted,
        "File ingested"
    );

    Ok(Json(IngestFileResponse {
        status: "ok".to_string(),
        chunks: "done".to_string(),
    }))
}
