//! Configuration management

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// LLM service configuration
    #[serde(default)]
    pub llm_service: LlmServiceConfig,

    /// Whether generated answers go through the audit pass
    #[serde(default)]
    pub audit_enabled: bool,
}

/// LLM service configuration for external inference
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmServiceConfig {
    /// Base URL of the LLM service for chat/completions. `None` means no
    /// service was configured; callers that need a URL anyway (local
    /// development) get the localhost fallback from [`Self::chat_url`].
    #[serde(default)]
    pub url: Option<String>,

    /// Model name for chat completions (normalization, extraction, answers)
    #[serde(default = "default_chat_model")]
    pub model: String,

    /// Model name for the audit pass (a lighter model keeps latency low)
    #[serde(default = "default_audit_model")]
    pub audit_model: String,

    /// Base URL for embeddings service (can be different from LLM URL)
    #[serde(default)]
    pub embedding_url: Option<String>,

    /// Model name for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Embedding dimensions
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// API key (optional, for authenticated services)
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Audit request timeout in seconds (kept short on purpose)
    #[serde(default = "default_audit_timeout")]
    pub audit_timeout_secs: u64,
}

const DEFAULT_LOCAL_URL: &str = "http://localhost:8000";

impl LlmServiceConfig {
    /// Chat/completions URL, falling back to localhost for local setups
    pub fn chat_url(&self) -> &str {
        self.url.as_deref().unwrap_or(DEFAULT_LOCAL_URL)
    }

    /// Get the embeddings URL (falls back to main URL if not specified)
    pub fn embeddings_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or_else(|| self.chat_url())
    }

    /// True when a service was actually configured: an explicit endpoint or
    /// an API key. The localhost fallback alone does not count, so a bare
    /// deployment surfaces the configuration-error answer instead of a
    /// silent "no information".
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() || self.url.is_some()
    }
}

impl Default for LlmServiceConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("CONVENIO_LLM_URL").ok(),
            model: default_chat_model(),
            audit_model: default_audit_model(),
            embedding_url: std::env::var("CONVENIO_EMBEDDING_URL").ok(),
            embedding_model: default_embedding_model(),
            embedding_dimensions: std::env::var("CONVENIO_EMBEDDING_DIMS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_embedding_dimensions),
            api_key: std::env::var("CONVENIO_LLM_API_KEY").ok(),
            timeout_secs: default_timeout(),
            audit_timeout_secs: default_audit_timeout(),
        }
    }
}

fn default_chat_model() -> String {
    std::env::var("CONVENIO_LLM_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string())
}

fn default_audit_model() -> String {
    std::env::var("CONVENIO_AUDIT_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string())
}

fn default_embedding_model() -> String {
    std::env::var("CONVENIO_EMBEDDING_MODEL")
        .unwrap_or_else(|_| "sentence-transformers/all-MiniLM-L6-v2".to_string())
}

fn default_embedding_dimensions() -> usize {
    384
}

fn default_timeout() -> u64 {
    30
}

fn default_audit_timeout() -> u64 {
    10
}

impl Config {
    /// Load config from default path, falling back to env-based defaults
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }
}
