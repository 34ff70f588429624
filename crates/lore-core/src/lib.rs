//! Lore Core - Domain types, traits, and shared configuration
//!
//! This crate defines the abstractions shared by the rest of the workspace:
//! - Common error type and result alias
//! - Records and search hits exchanged with the vector store
//! - Seam traits for embedding, vector storage and answer generation
//! - Configuration management

pub mod config;

pub use config::{
    AppConfig, ConfigError, LlmConfig, LoggingConfig, RagConfig, SamplingConfig, ServerConfig,
    StoreBackend, StoreConfig,
};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LoreError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("{service} returned HTTP {status}: {body}")]
    Upstream {
        service: String,
        status: u16,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Generation failed: {0}")]
    Generation(#[source] Box<LoreError>),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LoreError {
    /// Wrap a chat-side failure as a generation failure
    pub fn generation(cause: LoreError) -> Self {
        match cause {
            already @ LoreError::Generation(_) => already,
            other => LoreError::Generation(Box::new(other)),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoreError>;

// ============================================================================
// Records
// ============================================================================

/// A chunk of text paired with its embedding, ready to be stored.
///
/// The store assigns the identifier on insert.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub vector: Vec<f32>,
    pub text: String,
}

impl Record {
    pub fn new(vector: Vec<f32>, text: impl Into<String>) -> Self {
        Self {
            vector,
            text: text.into(),
        }
    }
}

/// A single nearest-neighbour hit, best first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub text: String,
    /// Cosine similarity
    pub score: f32,
}

/// Generated answer together with the context passages it was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagAnswer {
    pub answer: String,
    pub docs: Vec<String>,
}

/// Counts produced by one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Non-empty paragraphs found in the source
    pub paragraphs: usize,
    /// Unique chunks after overlap and deduplication
    pub chunks: usize,
    /// Records written to the vector store
    pub inserted: usize,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for embedding generation
#[async_trait::async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Generate embeddings for multiple texts in one request, in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LoreError::MalformedResponse("No embedding returned".to_string()))
    }

    /// Embedding dimension this client is expected to produce
    fn dimension(&self) -> usize;
}

/// Trait for vector database operations
#[async_trait::async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it does not exist yet
    async fn init_collection(&self) -> Result<()>;

    /// Insert records and make them searchable before returning.
    /// Returns the number of records written.
    async fn insert(&self, records: &[Record]) -> Result<usize>;

    /// Cosine nearest neighbours of `query_vector`, best first
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// Trait for answer generation
#[async_trait::async_trait]
pub trait LlmClient: Send + Sync {
    /// Answer `query` using only the given context passages
    async fn answer(&self, query: &str, context: &[String]) -> Result<String>;

    /// Whether the client has the credentials it needs
    fn is_configured(&self) -> bool;
}

// ============================================================================
// Tests
// ============================================================================
