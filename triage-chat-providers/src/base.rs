//! Base trait for model providers

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use triage_chat_core::session::Role;

/// Error type for provider operations
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("API error: {0}")]
    ApiError(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// A message as sent to the model service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Output format hint passed to the model service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseFormat {
    /// Ask the service to constrain output to a JSON document
    #[default]
    Json,
    /// No constraint
    Text,
}

/// One completion request: the full ordered message list for a turn
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Overrides the provider's default model
    pub model: Option<String>,
    pub format: ResponseFormat,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            format: ResponseFormat::default(),
        }
    }

    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Trait for model providers
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Send one non-streaming completion request.
    ///
    /// Returns the raw reply payload exactly as the service produced it, a
    /// JSON string in the common case. Classifying that payload is left to
    /// the caller.
    async fn complete(&self, request: CompletionRequest) -> ProviderResult<serde_json::Value>;

    /// Get the default model for this provider
    fn default_model(&self) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_wire_format() {
        let msg = ChatMessage::user("I feel dizzy");
        let value = serde_json::to_value(&msg).unwrap();
        assert_eq!(value, serde_json::json!({"role": "user", "content": "I feel dizzy"}));
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![ChatMessage::system("be careful")])
            .with_format(ResponseFormat::Text)
            .with_model("llama3.1");
        assert_eq!(request.format, ResponseFormat::Text);
        assert_eq!(request.model.as_deref(), Some("llama3.1"));
        assert_eq!(request.messages[0].role, Role::System);
    }
}
