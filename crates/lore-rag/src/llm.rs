//! LLM client implementation
//!
//! Chat-completion client for OpenAI-compatible APIs (SiliconFlow,
//! OpenAI, vLLM, ...). Every failure is reported as a generation failure.
//!
//! Author: Lore Contributors

use crate::prompt::{system_prompt, user_prompt};
use async_trait::async_trait;
use lore_core::{AppConfig, LlmClient, LoreError, Result, SamplingConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const SERVICE: &str = "chat API";

// ============================================================================
// OpenAI-compatible Client
// ============================================================================

/// OpenAI-compatible chat completion client
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    assistant_name: String,
    sampling: SamplingConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    min_p: f32,
    frequency_penalty: f32,
    n: u32,
    enable_thinking: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
struct Message {
    role: String,
    content: String,
}

impl Message {
    fn new(role: &str, content: String) -> Self {
        Self {
            role: role.to_string(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Choice {
    message: Message,
    finish_reason: Option<String>,
}

impl OpenAiClient {
    /// Create a new chat client
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LoreError::Config(format!("Failed to build chat HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            model: model.into(),
            assistant_name: "Lore".to_string(),
            sampling: SamplingConfig::default(),
        })
    }

    /// Create from config
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            config.llm.chat_url.clone(),
            config.llm.api_key.clone(),
            config.llm.chat_model.clone(),
            Duration::from_secs(config.llm.chat_timeout_secs),
        )?
        .with_assistant_name(config.llm.assistant_name.clone())
        .with_sampling(config.llm.sampling.clone()))
    }

    /// Set the persona used in the system instruction
    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    /// Override the sampling parameters
    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    fn build_request(&self, query: &str, context: &[String]) -> ChatRequest<'_> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                Message::new("system", system_prompt(&self.assistant_name)),
                Message::new("user", user_prompt(query, context)),
            ],
            max_tokens: self.sampling.max_tokens,
            temperature: self.sampling.temperature,
            top_p: self.sampling.top_p,
            top_k: self.sampling.top_k,
            min_p: self.sampling.min_p,
            frequency_penalty: self.sampling.frequency_penalty,
            n: self.sampling.n,
            enable_thinking: self.sampling.enable_thinking,
        }
    }

    async fn generate(&self, query: &str, context: &[String]) -> Result<String> {
        // Checked before building the request so nothing unauthenticated is sent
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LoreError::MissingCredential("LLM_API_KEY is not set".to_string()))?;

        let request = self.build_request(query, context);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LoreError::Http(format!("Chat request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LoreError::Upstream {
                service: SERVICE.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let result: ChatResponse = response.json().await.map_err(|e| {
            LoreError::MalformedResponse(format!("Failed to parse chat response: {e}"))
        })?;

        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| LoreError::MalformedResponse("No response generated".to_string()))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn answer(&self, query: &str, context: &[String]) -> Result<String> {
        tracing::info!(
            context = context.len(),
            model = %self.model,
            "Requesting answer"
        );

        match self.generate(query, context).await {
            Ok(answer) => {
                tracing::info!(chars = answer.len(), "Answer received");
                Ok(answer)
            }
            Err(e) => {
                tracing::error!(error = %e, "Chat completion failed");
                Err(LoreError::generation(e))
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an LLM client from config
pub fn create_llm_client(config: &AppConfig) -> Result<Arc<dyn LlmClient>> {
    Ok(Arc::new(OpenAiClient::from_config(config)?))
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
        format!("http://{addr}/v1/chat/completions")
    }

    fn client(endpoint: String, api_key: Option<&str>) -> OpenAiClient {
        OpenAiClient::new(
            endpoint,
            api_key.map(str::to_string),
            "Qwen/Qwen3-8B",
            Duration::from_secs(5),
        )
        .unwrap()
        .with_assistant_name("Mr. Normal")
    }

    fn context() -> Vec<String> {
        vec!["The library opens at 9am.".to_string()]
    }

    #[test]
    fn test_request_carries_sampling_and_messages() {
        let client = client("http://localhost".to_string(), Some("sk-test"));
        let request = client.build_request("When does the library open?", &context());
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "Qwen/Qwen3-8B");
        assert_eq!(body["max_tokens"], 512);
        assert_eq!(body["top_k"], 20);
        assert_eq!(body["n"], 1);
        assert_eq!(body["enable_thinking"], false);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");

        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("The library opens at 9am."));
        assert!(user.contains("When does the library open?"));
    }

    #[tokio::test]
    async fn test_answer_returns_trimmed_content() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|headers: axum::http::HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(headers["authorization"], "Bearer sk-test");
                assert_eq!(body["messages"].as_array().unwrap().len(), 2);
                Json(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "  At 9am.\n"}, "finish_reason": "stop"}
                    ]
                }))
            }),
        );
        let endpoint = serve(app).await;

        let answer = client(endpoint, Some("sk-test"))
            .answer("When does the library open?", &context())
            .await
            .unwrap();

        assert_eq!(answer, "At 9am.");
    }

    #[tokio::test]
    async fn test_http_error_is_generation_failure() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
        );
        let endpoint = serve(app).await;

        let err = client(endpoint, Some("sk-test"))
            .answer("q", &context())
            .await
            .unwrap_err();

        match err {
            LoreError::Generation(inner) => {
                assert!(matches!(*inner, LoreError::Upstream { status: 429, .. }));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_generation_failure() {
        let app = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({"choices": []})) }),
        );
        let endpoint = serve(app).await;

        let err = client(endpoint, Some("sk-test"))
            .answer("q", &context())
            .await
            .unwrap_err();

        assert!(matches!(err, LoreError::Generation(_)));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/v1/chat/completions",
            post(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Json(json!({"choices": []})) }
            }),
        );
        let endpoint = serve(app).await;

        let client = client(endpoint, None);
        assert!(!client.is_configured());

        let err = client.answer("q", &context()).await.unwrap_err();

        match err {
            LoreError::Generation(inner) => {
                assert!(matches!(*inner, LoreError::MissingCredential(_)));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_from_config() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-test".to_string());
        config.llm.assistant_name = "Mr. Normal".to_string();

        let client = OpenAiClient::from_config(&config).unwrap();
        assert!(client.is_configured());
        assert_eq!(client.model, "Qwen/Qwen3-8B");
        assert_eq!(client.assistant_name, "Mr. Normal");
        assert_eq!(client.sampling.max_tokens, 512);
    }
}
