//! In-process vector store
//!
//! Brute-force cosine scan over records held in memory. Nothing is
//! persisted; intended for local development and tests.

use async_trait::async_trait;
use lore_core::{Record, Result, SearchHit, VectorStore};
use tokio::sync::RwLock;
use uuid::Uuid;

pub struct MemoryStore {
    dimension: usize,
    points: RwLock<Vec<(Uuid, Record)>>,
}

impl MemoryStore {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            points: RwLock::new(Vec::new()),
        }
    }

    /// Number of stored records
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of stored texts in insertion order
    pub async fn texts(&self) -> Vec<String> {
        self.points
            .read()
            .await
            .iter()
            .map(|(_, record)| record.text.clone())
            .collect()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn init_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn insert(&self, records: &[Record]) -> Result<usize> {
        for record in records {
            super::check_dimension(self.dimension, &record.vector)?;
        }

        let mut points = self.points.write().await;
        points.extend(records.iter().cloned().map(|r| (Uuid::new_v4(), r)));
        Ok(records.len())
    }

    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<Vec<SearchHit>> {
        super::check_dimension(self.dimension, query_vector)?;

        let points = self.points.read().await;
        let mut hits: Vec<SearchHit> = points
            .iter()
            .map(|(_, record)| SearchHit {
                text: record.text.clone(),
                score: cosine_similarity(query_vector, &record.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }

    fn name(&self) -> &str {
        "memory"
    }
}
