//! Configuration loading, validation, and management for Lectern.
//!
//! Loads configuration from a TOML file with environment variable overrides
//! for secrets. Validates all settings at startup so the pipeline never has
//! to re-check its knobs mid-request.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `lectern.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the course catalog JSON file.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Retrieval budgets
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Outbound rate ceiling
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Retry policy for upstream calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Prompt assembly budget
    #[serde(default)]
    pub prompt: PromptConfig,

    /// Conversation history buffer
    #[serde(default)]
    pub history: HistoryConfig,

    /// Embedding service endpoint
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Generative model endpoint
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Vector index endpoint
    #[serde(default)]
    pub index: IndexConfig,

    /// HTTP gateway
    #[serde(default)]
    pub gateway: GatewayConfig,
}

fn default_catalog_path() -> String {
    "catalog.json".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("catalog_path", &self.catalog_path)
            .field("retrieval", &self.retrieval)
            .field("rate_limit", &self.rate_limit)
            .field("retry", &self.retry)
            .field("prompt", &self.prompt)
            .field("history", &self.history)
            .field("embedding", &self.embedding)
            .field("generation", &self.generation)
            .field("index", &self.index)
            .field("gateway", &self.gateway)
            .finish()
    }
}

/// Document retrieval budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Maximum documents fetched across all namespaces in one call.
    #[serde(default = "default_document_budget")]
    pub document_budget: usize,

    /// Nearest matches requested per namespace.
    #[serde(default = "default_per_namespace_top_k")]
    pub per_namespace_top_k: usize,

    /// Maximum namespaces searched per call.
    #[serde(default = "default_max_namespaces")]
    pub max_namespaces: usize,
}

fn default_document_budget() -> usize {
    30
}
fn default_per_namespace_top_k() -> usize {
    10
}
fn default_max_namespaces() -> usize {
    5
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            document_budget: default_document_budget(),
            per_namespace_top_k: default_per_namespace_top_k(),
            max_namespaces: default_max_namespaces(),
        }
    }
}

/// Process-wide outbound request ceiling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests_per_minute")]
    pub max_requests_per_minute: usize,
}

fn default_max_requests_per_minute() -> usize {
    200
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests_per_minute: default_max_requests_per_minute(),
        }
    }
}

/// Exponential backoff retry policy for upstream calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Re-attempts after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    5
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_max_delay_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

/// Prompt assembly budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Character budget for the citation block.
    #[serde(default = "default_character_budget")]
    pub character_budget: usize,
}

fn default_character_budget() -> usize {
    5000
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            character_budget: default_character_budget(),
        }
    }
}

/// Conversation history buffer bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_buffer_max_size")]
    pub buffer_max_size: usize,
}

fn default_buffer_max_size() -> usize {
    4000
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            buffer_max_size: default_buffer_max_size(),
        }
    }
}

/// Embedding service endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_openai_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_openai_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_url: default_openai_url(),
            api_key: None,
            model: default_embedding_model(),
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

/// Generative model endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_openai_url")]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_generation_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.05
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_url: default_openai_url(),
            api_key: None,
            model: default_generation_model(),
            temperature: default_temperature(),
        }
    }
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// Vector index endpoint.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct IndexConfig {
    /// Base URL of the index (e.g. the Pinecone index host).
    #[serde(default)]
    pub api_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl std::fmt::Debug for IndexConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

/// HTTP gateway binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8080
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a specific file path, falling back to
    /// defaults when the file does not exist.
    ///
    /// Environment variables override secrets after the file is read:
    /// - `LECTERN_EMBEDDING_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `LECTERN_GENERATION_API_KEY` (falls back to `OPENAI_API_KEY`)
    /// - `LECTERN_INDEX_API_KEY` (falls back to `PINECONE_API_KEY`)
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            tracing::info!("No config file found at {}, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides for secrets.
    fn apply_env_overrides(&mut self) {
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = std::env::var("LECTERN_EMBEDDING_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if self.generation.api_key.is_none() {
            self.generation.api_key = std::env::var("LECTERN_GENERATION_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }
        if self.index.api_key.is_none() {
            self.index.api_key = std::env::var("LECTERN_INDEX_API_KEY")
                .ok()
                .or_else(|| std::env::var("PINECONE_API_KEY").ok());
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.retrieval.document_budget == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.document_budget must be at least 1".into(),
            ));
        }
        if self.retrieval.per_namespace_top_k == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.per_namespace_top_k must be at least 1".into(),
            ));
        }
        if self.retrieval.max_namespaces == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.max_namespaces must be at least 1".into(),
            ));
        }
        if self.rate_limit.max_requests_per_minute == 0 {
            return Err(ConfigError::ValidationError(
                "rate_limit.max_requests_per_minute must be at least 1".into(),
            ));
        }
        if self.retry.base_delay_ms == 0 || self.retry.max_delay_ms < self.retry.base_delay_ms {
            return Err(ConfigError::ValidationError(
                "retry delays must satisfy 0 < base_delay_ms <= max_delay_ms".into(),
            ));
        }
        if self.prompt.character_budget == 0 {
            return Err(ConfigError::ValidationError(
                "prompt.character_budget must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(ConfigError::ValidationError(
                "generation.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        Ok(())
    }

    /// Generate a default config TOML string (for bootstrapping a deployment).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            retrieval: RetrievalConfig::default(),
            rate_limit: RateLimitConfig::default(),
            retry: RetryConfig::default(),
            prompt: PromptConfig::default(),
            history: HistoryConfig::default(),
            embedding: EmbeddingConfig::default(),
            generation: GenerationConfig::default(),
            index: IndexConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retrieval.document_budget, 30);
        assert_eq!(config.rate_limit.max_requests_per_minute, 200);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.prompt.character_budget, 5000);
        assert_eq!(config.history.buffer_max_size, 4000);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.retrieval.document_budget, 30);
        assert_eq!(parsed.gateway.port, config.gateway.port);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let toml_str = r#"
[retrieval]
document_budget = 50

[gateway]
port = 9000
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.retrieval.document_budget, 50);
        assert_eq!(config.retrieval.per_namespace_top_k, 10);
        assert_eq!(config.gateway.port, 9000);
        assert_eq!(config.retry.base_delay_ms, 1000);
    }

    #[test]
    fn zero_budget_rejected() {
        let config = AppConfig {
            retrieval: RetrievalConfig {
                document_budget: 0,
                ..RetrievalConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_retry_delays_rejected() {
        let config = AppConfig {
            retry: RetryConfig {
                base_delay_ms: 5000,
                max_delay_ms: 1000,
                ..RetryConfig::default()
            },
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/lectern.toml")).unwrap();
        assert_eq!(config.retrieval.document_budget, 30);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"[rate_limit]\nmax_requests_per_minute = 40\n")
            .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.rate_limit.max_requests_per_minute, 40);
    }

    #[test]
    fn debug_output_redacts_keys() {
        let config = AppConfig {
            embedding: EmbeddingConfig {
                api_key: Some("sk-secret".into()),
                ..EmbeddingConfig::default()
            },
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("document_budget"));
        assert!(toml_str.contains("catalog.json"));
    }
}
