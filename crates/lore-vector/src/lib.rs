//! Lore Vector - Embeddings and vector storage
//!
//! Provides the embedding API client and the vector store adapters
//! (Qdrant, in-process memory) behind the traits defined in `lore-core`.

use lore_core::{Result, StoreBackend, StoreConfig, VectorStore};
use std::sync::Arc;

pub mod embedding;
pub mod memory_store;
pub mod qdrant_store;

pub use embedding::{create_embedding_client, OpenAiEmbedding};
pub use memory_store::MemoryStore;
pub use qdrant_store::QdrantStore;

/// Open the configured vector store and make sure its collection exists
pub async fn create_vector_store(config: &StoreConfig) -> Result<Arc<dyn VectorStore>> {
    let store: Arc<dyn VectorStore> = match config.backend {
        StoreBackend::Qdrant => Arc::new(QdrantStore::new(config)?),
        StoreBackend::Memory => Arc::new(MemoryStore::new(config.dimension)),
    };

    store.init_collection().await?;
    tracing::info!(
        backend = %config.backend,
        collection = %config.collection,
        dimension = config.dimension,
        "Vector store ready"
    );

    Ok(store)
}

/// Reject vectors whose length does not match the collection
pub(crate) fn check_dimension(expected: usize, vector: &[f32]) -> Result<()> {
    if vector.len() != expected {
        return Err(lore_core::LoreError::VectorStore(format!(
            "Vector dimension mismatch: expected {expected}, got {}",
            vector.len()
        )));
    }
    Ok(())
}
