//! Embedding client for generating vector representations
//!
//! Talks to OpenAI-compatible `/embeddings` endpoints (SiliconFlow,
//! OpenAI, vLLM, ...). One request per batch, no retries.
//!
//! Author: Lore Contributors

use async_trait::async_trait;
use lore_core::{AppConfig, EmbeddingClient, LoreError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SERVICE: &str = "embedding API";

/// OpenAI-compatible embedding API client
pub struct OpenAiEmbedding {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dimension: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: Option<usize>,
}

impl OpenAiEmbedding {
    /// Create a new embedding client
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoreError::Config(format!("Failed to build embedding HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            dimension,
        })
    }

    /// Create from config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.llm.embedding_url.clone(),
            config.llm.api_key.clone(),
            config.llm.embedding_model.clone(),
            config.store.dimension,
            Duration::from_secs(config.llm.embedding_timeout_secs),
        )
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbedding {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LoreError::MissingCredential("LLM_API_KEY is not set".to_string()))?;

        tracing::info!(count = texts.len(), model = %self.model, "Requesting embeddings");

        let request = EmbeddingRequest {
            model: &self.model,
            input: texts,
            encoding_format: "float",
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LoreError::Http(format!("Embedding request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoreError::Upstream {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let result: EmbeddingResponse = response.json().await.map_err(|e| {
            LoreError::MalformedResponse(format!("Failed to parse embedding response: {e}"))
        })?;

        if result.data.len() != texts.len() {
            return Err(LoreError::MalformedResponse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                result.data.len()
            )));
        }

        let embeddings = order_by_index(result.data)?;

        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(LoreError::MalformedResponse(format!(
                "Expected {}-dimensional embeddings, got {}",
                self.dimension,
                bad.len()
            )));
        }

        tracing::debug!(count = embeddings.len(), "Embeddings received");
        Ok(embeddings)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Put embeddings back in input order.
///
/// Without indices the response order is used; with indices they must be
/// a permutation of `0..n`.
fn order_by_index(data: Vec<EmbeddingData>) -> Result<Vec<Vec<f32>>> {
    if data.iter().all(|d| d.index.is_none()) {
        return Ok(data.into_iter().map(|d| d.embedding).collect());
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; data.len()];
    for item in data {
        let index = item.index.ok_or_else(|| {
            LoreError::MalformedResponse("Embedding response mixes indexed and unindexed items".to_string())
        })?;
        let slot = slots.get_mut(index).ok_or_else(|| {
            LoreError::MalformedResponse(format!("Embedding index {index} out of range"))
        })?;
        if slot.is_some() {
            return Err(LoreError::MalformedResponse(format!(
                "Duplicate embedding index {index}"
            )));
        }
        *slot = Some(item.embedding);
    }

    Ok(slots.into_iter().flatten().collect())
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding client from config
pub fn create_embedding_client(config: &AppConfig) -> Result<Arc<dyn EmbeddingClient>> {
    Ok(Arc::new(OpenAiEmbedding::from_config(config)?))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/v1/embeddings")
    }

    fn client(endpoint: String, api_key: Option<&str>) -> OpenAiEmbedding {
        OpenAiEmbedding::new(
            endpoint,
            api_key.map(str::to_string),
            "Qwen/Qwen3-Embedding-0.6B",
            2,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_embed_batch_sends_openai_payload() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["model"], "Qwen/Qwen3-Embedding-0.6B");
                assert_eq!(body["encoding_format"], "float");
                assert_eq!(body["input"], json!(["first", "second"]));
                // Deliberately out of order
                Json(json!({
                    "data": [
                        {"embedding": [0.0, 1.0], "index": 1},
                        {"embedding": [1.0, 0.0], "index": 0}
                    ]
                }))
            }),
        );
        let endpoint = serve(app).await;

        let embeddings = client(endpoint, Some("sk-test"))
            .embed_batch(&["first".to_string(), "second".to_string()])
            .await
            .unwrap();

        assert_eq!(embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|| async { (StatusCode::UNAUTHORIZED, "invalid api key") }),
        );
        let endpoint = serve(app).await;

        let err = client(endpoint, Some("sk-bad"))
            .embed("hello")
            .await
            .unwrap_err();

        match err {
            LoreError::Upstream { status, body, .. } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_count_mismatch_is_malformed() {
        let app = Router::new().route(
            "/v1/embeddings",
            post(|| async { Json(json!({"data": [{"embedding": [1.0, 0.0]}]})) }),
        );
        let endpoint = serve(app).await;

        let err = client(endpoint, Some("sk-test"))
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();

        assert!(matches!(err, LoreError::MalformedResponse(_)));
    }

    async fn embed_with_response(response: Value) -> Result<Vec<Vec<f32>>> {
        let app = Router::new().route(
            "/v1/embeddings",
            post(move || {
                let response = response.clone();
                async move { Json(response) }
            }),
        );
        let endpoint = serve(app).await;

        client(endpoint, Some("sk-test"))
            .embed_batch(&["a".to_string(), "b".to_string()])
            .await
    }

    #[tokio::test]
    async fn test_wrong_dimension_is_malformed() {
        let err = embed_with_response(json!({
            "data": [
                {"embedding": [1.0, 0.0, 0.0], "index": 0},
                {"embedding": [0.0, 1.0, 0.0], "index": 1}
            ]
        }))
        .await
        .unwrap_err();

        assert!(matches!(err, LoreError::MalformedResponse(msg) if msg.contains("2-dimensional")));
    }

    #[tokio::test]
    async fn test_duplicate_index_is_malformed() {
        let err = embed_with_response(json!({
            "data": [
                {"embedding": [1.0, 0.0], "index": 0},
                {"embedding": [0.0, 1.0], "index": 0}
            ]
        }))
        .await
        .unwrap_err();

        assert!(matches!(err, LoreError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_malformed() {
        let err = embed_with_response(json!({
            "data": [
                {"embedding": [1.0, 0.0], "index": 0},
                {"embedding": [0.0, 1.0], "index": 2}
            ]
        }))
        .await
        .unwrap_err();

        assert!(matches!(err, LoreError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unindexed_items_keep_response_order() {
        let embeddings = embed_with_response(json!({
            "data": [
                {"embedding": [0.0, 1.0]},
                {"embedding": [1.0, 0.0]}
            ]
        }))
        .await
        .unwrap();

        assert_eq!(embeddings, vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/v1/embeddings",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(json!({"data": []})) }
            }),
        );
        let endpoint = serve(app).await;

        let err = client(endpoint, None).embed("hello").await.unwrap_err();

        assert!(matches!(err, LoreError::MissingCredential(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_batch_skips_request() {
        let embeddings = client("http://127.0.0.1:9/unreachable".to_string(), None)
            .embed_batch(&[])
            .await
            .unwrap();
        assert!(embeddings.is_empty());
    }

    #[test]
    fn test_from_config_uses_store_dimension() {
        let mut config = AppConfig::default();
        config.store.dimension = 384;
        let client = OpenAiEmbedding::from_config(&config).unwrap();
        assert_eq!(client.dimension(), 384);
    }
}
