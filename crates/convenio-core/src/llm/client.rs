//! HTTP client for external inference services (vLLM, OpenAI-compatible gateways)

use crate::config::LlmServiceConfig;
use crate::error::{ConvenioError, Result};
use crate::llm::{ChatMessage, Embedder, GenerativeClient};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

/// OpenAI-compatible chat + embeddings client
pub struct HttpLlmClient {
    http_client: reqwest::Client,
    config: LlmServiceConfig,
}

impl HttpLlmClient {
    /// Create new client from configuration
    pub fn new(config: LlmServiceConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ConvenioError::Http)?;
        Ok(Self {
            http_client,
            config,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(LlmServiceConfig::default())
    }

    fn auth_header(&self) -> Option<String> {
        self.config
            .api_key
            .as_ref()
            .map(|key| format!("Bearer {}", key))
    }

    async fn completion_request(
        &self,
        messages: Vec<ChatMessage>,
        json_mode: bool,
    ) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.config.chat_url());

        let mut payload = json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": 0.0,
        });
        if json_mode {
            payload["response_format"] = json!({"type": "json_object"});
        }

        let mut request = self.http_client.post(&url).json(&payload);
        if let Some(auth) = self.auth_header() {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ConvenioError::Llm(format!(
                "completion request failed: {} - {}",
                status, body
            )));
        }

        let completion: CompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ConvenioError::Llm("empty completion response".to_string()))
    }
}

#[async_trait]
impl GenerativeClient for HttpLlmClient {
    async fn chat_completion(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.completion_request(messages, false).await
    }

    async fn json_completion(&self, messages: Vec<ChatMessage>) -> Result<serde_json::Value> {
        let response = self.completion_request(messages, true).await?;
        super::extract_json_object(&response)
            .ok_or_else(|| ConvenioError::Llm("response is not JSON".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Embedder for HttpLlmClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/v1/embeddings", self.config.embeddings_url());

        let payload = json!({
            "model": self.config.embedding_model,
            "input": text,
        });

        let mut request = self.http_client.post(&url).json(&payload);
        if let Some(auth) = self.auth_header() {
            request = request.header("Authorization", auth);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            return Err(ConvenioError::Llm(format!(
                "embedding request failed: {}",
                status
            )));
        }

        let embedding: EmbeddingResponse = response.json().await?;
        embedding
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| ConvenioError::Llm("empty embedding response".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.config.embedding_dimensions
    }

    fn model_name(&self) -> &str {
        &self.config.embedding_model
    }
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
