//! LLM trait definitions

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Chat message for completion requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generative-language service client.
///
/// The service supplies *facts* (free text, extracted values); all
/// arithmetic stays in local code. Callers treat its output as untrusted
/// and validate before use.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Generate a free-text completion
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String>;

    /// Generate a completion that must be a single JSON object.
    ///
    /// The default implementation extracts the first JSON object from the
    /// free-text response, tolerating markdown code fences.
    async fn json_completion(&self, messages: Vec<ChatMessage>) -> Result<serde_json::Value> {
        let response = self.chat_completion(messages).await?;
        extract_json_object(&response)
            .ok_or_else(|| crate::error::ConvenioError::Llm("response is not JSON".to_string()))
    }

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Embedding generation trait
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate embedding for single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Get model name
    fn model_name(&self) -> &str;
}

/// Extract the first JSON object embedded in a model response, stripping
/// markdown code fences when present.
pub fn extract_json_object(response: &str) -> Option<serde_json::Value> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&response[start..=end]).ok()
}
