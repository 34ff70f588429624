//! Lore RAG - Retrieval-Augmented Generation pipeline
//!
//! This crate implements the paragraph RAG pipeline:
//! - Ingestion: split a document into paragraph chunks (with optional
//!   overlap), deduplicate, embed in one batch and insert into the store
//! - Retrieval: embed a query, search the store, deduplicate and cap at top-K
//! - Answering: hand the retrieved context to the LLM client
//!
//! The pipeline owns no global state; the store and clients are injected.
//!
//! Author: Lore Contributors

use lore_core::{
    EmbeddingClient, IngestReport, LlmClient, LoreError, RagAnswer, RagConfig, Record, Result,
    VectorStore,
};
use std::path::Path;
use std::sync::Arc;

pub mod chunker;
pub mod llm;
pub mod prompt;

pub use chunker::{chunk_document, unique_preserve, ChunkedDocument};
pub use llm::{create_llm_client, OpenAiClient};
pub use prompt::PromptBuilder;

// ============================================================================
// RAG Pipeline
// ============================================================================

/// Ingestion, retrieval and answering over one vector collection
pub struct RagPipeline {
    embedder: Arc<dyn EmbeddingClient>,
    store: Arc<dyn VectorStore>,
    llm: Arc<dyn LlmClient>,
    config: RagConfig,
}

impl RagPipeline {
    /// Create a new pipeline
    pub fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        llm: Arc<dyn LlmClient>,
        config: RagConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            llm,
            config,
        }
    }

    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Name of the underlying vector store
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Whether the LLM client has its credentials
    pub fn llm_configured(&self) -> bool {
        self.llm.is_configured()
    }

    /// Read a UTF-8 file and ingest its paragraphs
    pub async fn ingest_file(
        &self,
        path: impl AsRef<Path>,
        overlap_ratio: f64,
    ) -> Result<IngestReport> {
        let path = path.as_ref();
        chunker::validate_overlap_ratio(overlap_ratio)?;
        tracing::info!(path = %path.display(), overlap_ratio, "Loading file");

        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(LoreError::FileNotFound(path.to_path_buf()));
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoreError::Io(format!("Failed to read {}: {e}", path.display())))?;

        self.ingest_text(&content, overlap_ratio).await
    }

    /// Ingest an in-memory document
    pub async fn ingest_text(&self, content: &str, overlap_ratio: f64) -> Result<IngestReport> {
        let doc = chunk_document(content, overlap_ratio)?;
        tracing::info!(
            paragraphs = doc.paragraphs,
            chunks = doc.chunks.len(),
            "Document chunked"
        );

        let inserted = self.embed_and_insert(doc.chunks.clone()).await?;
        tracing::info!(inserted, "Ingestion finished");

        Ok(IngestReport {
            paragraphs: doc.paragraphs,
            chunks: doc.chunks.len(),
            inserted,
        })
    }

    /// Insert one raw document as a single chunk, without splitting
    pub async fn add_document(&self, text: &str) -> Result<usize> {
        let text = text.trim();
        if text.is_empty() {
            return Err(LoreError::Validation("Document text is empty".to_string()));
        }
        tracing::debug!(chars = text.len(), "Adding single document");

        self.embed_and_insert(vec![text.to_string()]).await
    }

    async fn embed_and_insert(&self, chunks: Vec<String>) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }

        let embeddings = self.embedder.embed_batch(&chunks).await?;
        if embeddings.len() != chunks.len() {
            return Err(LoreError::MalformedResponse(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        for vector in &embeddings {
            self.check_embedding(vector)?;
        }

        let records: Vec<Record> = embeddings
            .into_iter()
            .zip(chunks)
            .map(|(vector, text)| Record::new(vector, text))
            .collect();

        self.store.insert(&records).await
    }

    /// Vectors must match the dimension the embedder was configured for
    fn check_embedding(&self, vector: &[f32]) -> Result<()> {
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(LoreError::MalformedResponse(format!(
                "Expected {expected}-dimensional embedding, got {}",
                vector.len()
            )));
        }
        Ok(())
    }

    /// Nearest chunk texts for `query`, deduplicated and capped at `top_k`
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<String>> {
        if query.trim().is_empty() {
            return Err(LoreError::Validation("Query cannot be empty".to_string()));
        }
        if top_k == 0 {
            return Err(LoreError::Validation("top_k must be at least 1".to_string()));
        }
        tracing::info!(top_k, "Searching");

        let query_vector = self.embedder.embed(query).await?;
        self.check_embedding(&query_vector)?;
        let hits = self.store.search(&query_vector, top_k).await?;
        let found = hits.len();

        let mut texts = unique_preserve(hits.into_iter().map(|hit| hit.text));
        texts.truncate(top_k);

        tracing::info!(hits = texts.len(), before_dedup = found, "Search finished");
        Ok(texts)
    }

    /// Retrieve context and generate an answer; `NotFound` when nothing matches
    pub async fn answer(&self, query: &str, top_k: usize) -> Result<RagAnswer> {
        let docs = self.retrieve(query, top_k).await?;
        if docs.is_empty() {
            return Err(LoreError::NotFound("No relevant documents found".to_string()));
        }

        let answer = self.llm.answer(query, &docs).await?;
        Ok(RagAnswer { answer, docs })
    }
}

// ============================================================================
// Tests
// ============================================================================
