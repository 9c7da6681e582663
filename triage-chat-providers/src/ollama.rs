//! Ollama HTTP client implementation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use triage_chat_core::config::ModelConfig;

use crate::base::{
    ChatMessage, CompletionRequest, ModelProvider, ProviderError, ProviderResult, ResponseFormat,
};

/// Chat request body
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct SamplingOptions {
    temperature: f32,
    top_p: f32,
}

/// Chat response body; `/api/chat` fills `message`, `/api/generate` fills `response`
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    response: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Ollama provider client
pub struct OllamaClient {
    client: Client,
    api_base: String,
    default_model: String,
    options: SamplingOptions,
}

impl OllamaClient {
    /// Create a new client
    pub fn new(
        api_base: impl Into<String>,
        default_model: impl Into<String>,
        temperature: f32,
        top_p: f32,
        timeout: Duration,
    ) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client: Client::builder()
                .timeout(timeout)
                .http1_only() // local model hosts speak HTTP/1.1
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_base,
            default_model: default_model.into(),
            options: SamplingOptions { temperature, top_p },
        }
    }

    /// Create a client from the model section of the configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        Self::new(
            config.api_base.clone(),
            config.model.clone(),
            config.temperature,
            config.top_p,
            Duration::from_secs(config.timeout_secs),
        )
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Pick the raw payload, preferring `message.content` over `response`
    fn extract_payload(response: ChatResponse) -> ProviderResult<serde_json::Value> {
        if let Some(content) = response.message.and_then(|m| m.content) {
            return Ok(serde_json::Value::String(content));
        }
        match response.response {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(ProviderError::InvalidResponse(
                "Neither message.content nor response present".to_string(),
            )),
        }
    }
}

#[async_trait]
impl ModelProvider for OllamaClient {
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<serde_json::Value> {
        let model = request
            .model
            .unwrap_or_else(|| self.default_model.clone());

        let body = ChatRequest {
            model: &model,
            messages: &request.messages,
            format: match request.format {
                ResponseFormat::Json => Some("json"),
                ResponseFormat::Text => None,
            },
            stream: false,
            options: self.options,
        };

        debug!(
            "Sending chat request to {} with model {} ({} messages)",
            self.api_base,
            model,
            request.messages.len()
        );

        let url = format!("{}/api/chat", self.api_base);
        let response = self.client.post(&url).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::ApiError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let response_data: ChatResponse = response.json().await?;
        Self::extract_payload(response_data)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::from_config(&ModelConfig::default())
    }
}
