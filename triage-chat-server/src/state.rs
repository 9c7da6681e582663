use serde::{Deserialize, Serialize};
use std::sync::Arc;
use triage_chat_agent::TurnHandler;
use triage_chat_providers::ChatMessage;

#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<TurnHandler>,
}

impl AppState {
    pub fn new(handler: TurnHandler) -> Self {
        Self {
            handler: Arc::new(handler),
        }
    }
}

/// Body of `POST /api/symptom-checker`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomRequest {
    pub message: String,
    /// Prior turns held by the caller; the server keeps no session
    #[serde(default)]
    pub history: Vec<ChatMessage>,
}
