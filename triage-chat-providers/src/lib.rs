//! Model service integrations for triage-chat
//!
//! This crate defines the provider boundary and the Ollama implementation.

pub mod base;
pub mod ollama;

pub use base::{
    ChatMessage, CompletionRequest, ModelProvider, ProviderError, ProviderResult, ResponseFormat,
};
pub use ollama::OllamaClient;
