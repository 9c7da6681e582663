//! Turn handling: one user input, one model call, one normalized reply

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};
use triage_chat_core::session::{Body, Message, SessionStore, StructuredResponse};
use triage_chat_core::utils::truncate;
use triage_chat_providers::{ChatMessage, CompletionRequest, ModelProvider, ResponseFormat};

use crate::context::{ContextBuilder, ContextEntry};
use crate::normalizer::ResponseNormalizer;

/// Error text returned to callers when the model call fails
pub const GENERIC_ERROR: &str = "Something went wrong";

/// Result of one stateless turn, serialized as `{"structured": ...}`,
/// `{"reply": "..."}` or `{"error": "..."}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnOutcome {
    Structured(StructuredResponse),
    Reply(String),
    Error(String),
}

impl TurnOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, TurnOutcome::Error(_))
    }
}

impl From<Message> for TurnOutcome {
    fn from(message: Message) -> Self {
        match message.body {
            Body::Structured { data } => TurnOutcome::Structured(data),
            Body::Freeform { text } => TurnOutcome::Reply(text),
        }
    }
}

/// Runs turns against a model provider
pub struct TurnHandler {
    provider: Arc<dyn ModelProvider>,
    context: ContextBuilder,
    normalizer: ResponseNormalizer,
    format: ResponseFormat,
    model: String,
}

impl TurnHandler {
    /// Create a handler using the provider's default model
    pub fn new(provider: Arc<dyn ModelProvider>, model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| provider.default_model());
        Self {
            provider,
            context: ContextBuilder::new(),
            normalizer: ResponseNormalizer::default(),
            format: ResponseFormat::Json,
            model,
        }
    }

    /// Replace the context builder
    pub fn with_context(mut self, context: ContextBuilder) -> Self {
        self.context = context;
        self
    }

    /// Replace the response normalizer
    pub fn with_normalizer(mut self, normalizer: ResponseNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Set the output format hint sent to the model host
    pub fn with_format(mut self, format: ResponseFormat) -> Self {
        self.format = format;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Handle one turn without a session: the caller supplies prior history.
    ///
    /// Upstream failures become [`TurnOutcome::Error`] with a generic message;
    /// the detail only goes to the log.
    pub async fn handle_turn(
        &self,
        user_text: &str,
        prior_history: &[ChatMessage],
    ) -> TurnOutcome {
        let window = ContextBuilder::bound_history(prior_history, self.context.limit());
        match self.call_model(&window, user_text).await {
            Some(raw) => self.normalizer.normalize(Some(&raw)).into(),
            None => TurnOutcome::Error(GENERIC_ERROR.to_string()),
        }
    }

    /// Handle one turn against a session store.
    ///
    /// The context is taken before the user message is appended. Blank input
    /// is ignored and leaves the store untouched. On upstream failure an
    /// apology message is appended and returned. Persistence failures are
    /// logged and otherwise ignored.
    pub async fn run_turn(&self, store: &mut SessionStore, user_text: &str) -> Option<Message> {
        if user_text.trim().is_empty() {
            debug!("Ignoring blank user input");
            return None;
        }

        debug!("User input: {}", truncate(user_text, 80));
        let window = self.context.window(store.session());
        if let Err(e) = store.append(Message::user(user_text)) {
            warn!("Failed to persist user message: {}", e);
        }

        let raw = self.call_model(&window, user_text).await;
        let reply = self.normalizer.normalize(raw.as_ref());
        if let Err(e) = store.append(reply.clone()) {
            warn!("Failed to persist assistant reply: {}", e);
        }

        Some(reply)
    }

    async fn call_model(
        &self,
        window: &[ContextEntry],
        user_text: &str,
    ) -> Option<serde_json::Value> {
        let messages = self.context.build_messages(window, user_text);
        let request = CompletionRequest::new(messages)
            .with_model(self.model.clone())
            .with_format(self.format);

        debug!(
            "Calling model {} with {} context entries",
            self.model,
            window.len()
        );
        match self.provider.complete(request).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                error!("Model call failed: {}", e);
                None
            }
        }
    }
}
