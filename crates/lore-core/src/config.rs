//! Lore Configuration Management
//!
//! Handles configuration from an optional TOML file and environment
//! variables, with defaults suitable for local development.
//! The API key is only ever read from the environment.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming an optional TOML config file
pub const CONFIG_PATH_ENV: &str = "LORE_CONFIG";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Vector store configuration
    pub store: StoreConfig,

    /// Embedding and chat API configuration
    pub llm: LlmConfig,

    /// RAG pipeline configuration
    pub rag: RagConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load the config file named by `LORE_CONFIG` (if any), then apply
    /// environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path)?.with_env_override()?,
            _ => Self::from_env()?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_override()
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })
    }

    /// Apply environment variables (env takes precedence over file values)
    pub fn with_env_override(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup, keyed by env variable name
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(host) = lookup("API_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("API_PORT") {
            self.server.port = parse_value("API_PORT", port)?;
        }
        if let Some(origins) = lookup("CORS_ORIGINS") {
            self.server.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // Vector store
        if let Some(backend) = lookup("VECTOR_BACKEND") {
            self.store.backend = backend.parse()?;
        }
        if let Some(url) = lookup("QDRANT_URL") {
            self.store.qdrant_url = url;
        }
        if let Some(collection) = lookup("COLLECTION_NAME") {
            self.store.collection = collection;
        }
        if let Some(dimension) = lookup("EMBEDDING_DIMENSION") {
            self.store.dimension = parse_value("EMBEDDING_DIMENSION", dimension)?;
        }
        if let Some(ef) = lookup("SEARCH_EF") {
            self.store.search_ef = parse_value("SEARCH_EF", ef)?;
        }

        // Embedding / chat APIs
        if let Some(url) = lookup("EMBEDDING_API_URL") {
            self.llm.embedding_url = url;
        }
        if let Some(url) = lookup("CHAT_API_URL") {
            self.llm.chat_url = url;
        }
        if let Some(model) = lookup("EMBEDDING_MODEL") {
            self.llm.embedding_model = model;
        }
        if let Some(model) = lookup("CHAT_MODEL") {
            self.llm.chat_model = model;
        }
        if let Some(key) = lookup("LLM_API_KEY") {
            let key = key.trim().to_string();
            self.llm.api_key = (!key.is_empty()).then_some(key);
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(json) = lookup("LOG_JSON") {
            self.logging.json_format = parse_value("LOG_JSON", json)?;
        }

        Ok(self)
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "store.dimension".to_string(),
                value: "0".to_string(),
            });
        }
        if self.rag.default_top_k == 0 {
            return Err(ConfigError::InvalidValue {
                key: "rag.default_top_k".to_string(),
                value: "0".to_string(),
            });
        }
        let ratio = self.rag.default_overlap_ratio;
        if !(0.0..1.0).contains(&ratio) {
            return Err(ConfigError::InvalidValue {
                key: "rag.default_overlap_ratio".to_string(),
                value: ratio.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value,
    })
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed origins for CORS (empty allows any origin)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origins: vec![],
        }
    }
}

/// Vector database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Which vector store implementation to use
    pub backend: StoreBackend,

    /// Qdrant gRPC URL
    pub qdrant_url: String,

    /// Collection name
    pub collection: String,

    /// Vector dimension (must match embedding model)
    pub dimension: usize,

    /// Approximate-search beam width passed with every query
    pub search_ef: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Qdrant,
            qdrant_url: "http://localhost:6334".to_string(),
            collection: "rag_documents".to_string(),
            dimension: 1024, // Qwen3-Embedding-0.6B
            search_ef: 64,
        }
    }
}

/// Supported vector store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Qdrant,
    Memory,
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "qdrant" => Ok(Self::Qdrant),
            "memory" => Ok(Self::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "VECTOR_BACKEND".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Qdrant => write!(f, "qdrant"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Embedding and chat API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Bearer token shared by both APIs; environment only
    #[serde(skip)]
    pub api_key: Option<String>,

    /// Embedding endpoint
    pub embedding_url: String,

    /// Chat completion endpoint
    pub chat_url: String,

    /// Embedding model name
    pub embedding_model: String,

    /// Chat model name
    pub chat_model: String,

    /// Embedding request timeout in seconds
    pub embedding_timeout_secs: u64,

    /// Chat request timeout in seconds
    pub chat_timeout_secs: u64,

    /// Persona the assistant answers as
    pub assistant_name: String,

    /// Fixed sampling parameters sent with every chat request
    pub sampling: SamplingConfig,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            embedding_url: "https://api.siliconflow.cn/v1/embeddings".to_string(),
            chat_url: "https://api.siliconflow.cn/v1/chat/completions".to_string(),
            embedding_model: "Qwen/Qwen3-Embedding-0.6B".to_string(),
            chat_model: "Qwen/Qwen3-8B".to_string(),
            embedding_timeout_secs: 60,
            chat_timeout_secs: 15,
            assistant_name: "Lore".to_string(),
            sampling: SamplingConfig::default(),
        }
    }
}

/// Chat sampling parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub min_p: f32,
    pub frequency_penalty: f32,
    pub n: u32,
    pub enable_thinking: bool,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 512,
            temperature: 0.7,
            top_p: 0.8,
            top_k: 20,
            min_p: 0.0,
            frequency_penalty: 0.5,
            n: 1,
            enable_thinking: false,
        }
    }
}

/// RAG pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Results returned when a query does not specify top_k
    pub default_top_k: usize,

    /// Overlap ratio used when an ingest request does not specify one
    pub default_overlap_ratio: f64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            default_top_k: 3,
            default_overlap_ratio: 0.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.store.dimension, 1024);
        assert_eq!(config.store.collection, "rag_documents");
        assert_eq!(config.rag.default_top_k, 3);
        assert!(config.llm.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::default()
            .with_overrides(lookup(&[
                ("API_PORT", "9090"),
                ("VECTOR_BACKEND", "memory"),
                ("COLLECTION_NAME", "notes"),
                ("EMBEDDING_DIMENSION", "384"),
                ("LLM_API_KEY", "sk-test"),
                ("CORS_ORIGINS", "http://a.test, ,http://b.test"),
                ("LOG_JSON", "true"),
            ]))
            .unwrap();

        assert_eq!(config.server.port, 9090);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.collection, "notes");
        assert_eq!(config.store.dimension, 384);
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.server.cors_origins, vec!["http://a.test", "http://b.test"]);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        let config = AppConfig::default()
            .with_overrides(lookup(&[("LLM_API_KEY", "   ")]))
            .unwrap();
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_invalid_env_value() {
        let err = AppConfig::default()
            .with_overrides(lookup(&[("API_PORT", "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "API_PORT"));

        assert!(AppConfig::default()
            .with_overrides(lookup(&[("VECTOR_BACKEND", "milvus")]))
            .is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.store.dimension = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rag.default_overlap_ratio = 1.0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.rag.default_top_k = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_never_reads_api_key() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[store]
collection = "handbook"
dimension = 768

[llm]
api_key = "sk-from-file"
chat_model = "Qwen/Qwen3-32B"
"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.store.collection, "handbook");
        assert_eq!(config.store.dimension, 768);
        assert_eq!(config.store.qdrant_url, "http://localhost:6334");
        assert_eq!(config.llm.chat_model, "Qwen/Qwen3-32B");
        assert!(config.llm.api_key.is_none());
    }

    #[test]
    fn test_store_backend_parse() {
        assert_eq!("qdrant".parse::<StoreBackend>().unwrap(), StoreBackend::Qdrant);
        assert_eq!("Memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert!("invalid".parse::<StoreBackend>().is_err());
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
        assert_eq!(
            StoreBackend::Qdrant.to_string().parse::<StoreBackend>().unwrap(),
            StoreBackend::Qdrant
        );
    }
}
