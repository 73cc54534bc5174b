//! OpenAI-compatible embedding and chat-completion client.
//!
//! Works with OpenAI, OpenRouter, vLLM, Ollama, and any endpoint exposing
//! the `/v1/embeddings` and `/v1/chat/completions` surfaces.

use async_trait::async_trait;
use lectern_core::{EmbeddingService, GenerativeModel, UpstreamError};
use serde::Deserialize;
use tracing::debug;

/// Client for an OpenAI-compatible API, serving both the embedding and the
/// generation side of the pipeline.
pub struct OpenAiCompatClient {
    base_url: String,
    api_key: String,
    embedding_model: String,
    chat_model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl OpenAiCompatClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            embedding_model: "text-embedding-3-small".into(),
            chat_model: "gpt-4o-mini".into(),
            temperature: 0.05,
            client,
        }
    }

    pub fn with_embedding_model(mut self, model: impl Into<String>) -> Self {
        self.embedding_model = model.into();
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, UpstreamError> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| UpstreamError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if status != 200 {
            let message = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Api {
                status_code: status,
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl EmbeddingService for OpenAiCompatClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, UpstreamError> {
        let url = format!("{}/embeddings", self.base_url);
        let body = serde_json::json!({
            "model": self.embedding_model,
            "input": text,
            "encoding_format": "float",
        });

        debug!(model = %self.embedding_model, chars = text.len(), "Sending embedding request");

        let response = self.post_json(&url, &body).await?;
        let parsed: EmbeddingApiResponse =
            response.json().await.map_err(|e| UpstreamError::Api {
                status_code: 200,
                message: format!("Failed to parse embedding response: {e}"),
            })?;

        // No data means no vector; the retriever treats that as a failed
        // embedding.
        Ok(parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .unwrap_or_default())
    }
}

#[async_trait]
impl GenerativeModel for OpenAiCompatClient {
    async fn generate(&self, prompt: &str) -> Result<String, UpstreamError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
            "stream": false,
        });

        debug!(model = %self.chat_model, prompt_chars = prompt.len(), "Sending completion request");

        let response = self.post_json(&url, &body).await?;
        let parsed: ChatApiResponse = response.json().await.map_err(|e| UpstreamError::Api {
            status_code: 200,
            message: format!("Failed to parse completion response: {e}"),
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }
}

// --- API types (internal) ---

#[derive(Debug, Deserialize)]
struct EmbeddingApiResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_models_and_temperature() {
        let client = OpenAiCompatClient::new("https://api.openai.com/v1/", "sk-test")
            .with_embedding_model("text-embedding-3-large")
            .with_chat_model("gpt-4o")
            .with_temperature(0.3);

        assert_eq!(client.base_url, "https://api.openai.com/v1");
        assert_eq!(client.embedding_model, "text-embedding-3-large");
        assert_eq!(client.chat_model, "gpt-4o");
        assert!((client.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn parse_embedding_response() {
        let data = r#"{
            "data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}],
            "model": "text-embedding-3-small",
            "usage": {"prompt_tokens": 8, "total_tokens": 8}
        }"#;
        let parsed: EmbeddingApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].embedding, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn parse_empty_embedding_response() {
        let parsed: EmbeddingApiResponse = serde_json::from_str(r#"{"data": []}"#).unwrap();
        assert!(parsed.data.is_empty());
    }

    #[test]
    fn parse_chat_response() {
        let data = r#"{
            "model": "gpt-4o-mini",
            "choices": [{"message": {"role": "assistant", "content": "The answer."}, "finish_reason": "stop"}]
        }"#;
        let parsed: ChatApiResponse = serde_json::from_str(data).unwrap();
        assert_eq!(
            parsed.choices[0].message.content.as_deref(),
            Some("The answer.")
        );
    }

    #[test]
    fn parse_chat_response_without_content() {
        let data = r#"{"choices": [{"message": {"role": "assistant"}}]}"#;
        let parsed: ChatApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
