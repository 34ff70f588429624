//! Qdrant implementation for vector storage
//!
//! Provides connection management and insert/search operations
//! for document chunk embeddings.
//!
//! Author: Lore Contributors

use async_trait::async_trait;
use lore_core::{LoreError, Record, Result, SearchHit, StoreConfig, VectorStore};
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchParamsBuilder, SearchPointsBuilder,
    UpsertPointsBuilder, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Qdrant vector store implementation
pub struct QdrantStore {
    client: Qdrant,
    collection: String,
    dimension: usize,
    search_ef: u64,
}

impl QdrantStore {
    /// Create a new Qdrant connection
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let client = Qdrant::from_url(&config.qdrant_url)
            .build()
            .map_err(|e| LoreError::VectorStore(format!("Qdrant connection failed: {e}")))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            dimension: config.dimension,
            search_ef: config.search_ef,
        })
    }
}

/// Payload stored with each vector
#[derive(Debug, Clone, Serialize)]
struct VectorPayload<'a> {
    text: &'a str,
}

fn to_point(record: &Record) -> PointStruct {
    let payload: HashMap<String, qdrant_client::qdrant::Value> =
        serde_json::to_value(VectorPayload { text: &record.text })
            .unwrap_or_default()
            .as_object()
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.into()))
            .collect();

    PointStruct::new(Uuid::new_v4().to_string(), record.vector.clone(), payload)
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn init_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| LoreError::VectorStore(format!("Failed to check collection: {e}")))?;

        if exists {
            tracing::info!(collection = %self.collection, "Collection already exists");
            return Ok(());
        }

        tracing::info!(
            collection = %self.collection,
            dimension = self.dimension,
            "Collection missing, creating it"
        );
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(|e| LoreError::VectorStore(format!("Failed to create collection: {e}")))?;

        Ok(())
    }

    async fn insert(&self, records: &[Record]) -> Result<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        for record in records {
            super::check_dimension(self.dimension, &record.vector)?;
        }

        let points: Vec<PointStruct> = records.iter().map(to_point).collect();

        // wait(true) returns only once the points are indexed and searchable
        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| LoreError::VectorStore(format!("Failed to upsert vectors: {e}")))?;

        Ok(records.len())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        let results = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, query_vector.to_vec(), top_k as u64)
                    .with_payload(true)
                    .params(SearchParamsBuilder::default().hnsw_ef(self.search_ef)),
            )
            .await
            .map_err(|e| LoreError::VectorStore(format!("Vector search failed: {e}")))?;

        let hits = results
            .result
            .into_iter()
            .filter_map(|point| {
                let text = point.payload.get("text").and_then(|v| v.as_str())?;
                Some(SearchHit {
                    text: text.to_string(),
                    score: point.score,
                })
            })
            .collect();

        Ok(hits)
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}
