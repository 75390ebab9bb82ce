//! Ollama chat client.

use async_trait::async_trait;
use ragdoc_core::{GenerationConfig, LanguageModel, LlmError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "llama3.1";

/// Where a local Ollama server listens by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Connection settings for an Ollama server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Server base URL
    pub base_url: String,
    /// Model name
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 300,
        }
    }
}

impl OllamaConfig {
    /// Replace the base URL with `OLLAMA_HOST` when that variable is set.
    #[must_use]
    pub fn with_env_override(mut self) -> Self {
        if let Ok(host) = std::env::var("OLLAMA_HOST")
            && !host.trim().is_empty()
        {
            self.base_url = normalize_host(&host);
        }
        self
    }
}

/// Accept `host:port` as well as full URLs, and drop trailing slashes.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{host}")
    }
}

/// Client for `POST /api/chat` on an Ollama server.
pub struct OllamaClient {
    config: OllamaConfig,
    /// HTTP client.
    client: reqwest::Client,
}

impl OllamaClient {
    /// Create a client with the configured timeout.
    pub fn new(config: OllamaConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Http(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(config, client))
    }

    /// Create a client that sends requests through `client`.
    #[must_use]
    pub fn with_client(config: OllamaConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Settings in use.
    #[must_use]
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }
}

/// Non-streaming chat request carrying the prompt as one user message.
fn chat_request(model: &str, prompt: &str, config: &GenerationConfig) -> Value {
    let mut body = json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "stream": false,
    });

    let mut options = Map::new();
    if let Some(temperature) = config.temperature {
        options.insert("temperature".to_string(), json!(temperature));
    }
    if let Some(max_tokens) = config.max_tokens {
        options.insert("num_predict".to_string(), json!(max_tokens));
    }
    if !options.is_empty() {
        body["options"] = Value::Object(options);
    }

    body
}

/// Pull `message.content` out of a chat response.
fn parse_chat_response(json: &Value) -> Result<String, LlmError> {
    if let Some(content) = json["message"]["content"].as_str() {
        return Ok(content.to_string());
    }
    if let Some(error) = json["error"].as_str() {
        return Err(LlmError::InvalidResponse(error.to_string()));
    }
    Err(LlmError::InvalidResponse(
        "response has no message.content".to_string(),
    ))
}

#[async_trait]
impl LanguageModel for OllamaClient {
    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError> {
        let url = self.chat_url();
        let body = chat_request(&self.config.model, prompt, config);
        debug!("Sending {} char prompt to {} ({})", prompt.len(), url, self.config.model);

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(format!("ollama connection failed ({url}): {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: text,
            });
        }

        let json: Value = resp
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("response is not JSON: {e}")))?;

        let answer = parse_chat_response(&json)?;
        debug!("Received {} char answer", answer.len());
        Ok(answer)
    }
}
