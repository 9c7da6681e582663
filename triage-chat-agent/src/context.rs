//! Context builder for assembling model requests

use serde::{Deserialize, Serialize};
use triage_chat_core::session::{Role, Session};
use triage_chat_providers::ChatMessage;

/// Default number of prior messages sent with each request
pub const DEFAULT_CONTEXT_LIMIT: usize = 8;

/// One flattened prior turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub role: Role,
    pub text: String,
}

/// Bounded, oldest-first list of prior turns; recomputed every turn
pub type ContextWindow = Vec<ContextEntry>;

const SYSTEM_PROMPT: &str = r#"You are a careful, evidence-informed medical assistant.
You are not a doctor and this is not medical advice; encourage consulting a qualified clinician, especially for red-flag symptoms. When in doubt, advise seeking professional care.

Reply with ONLY a JSON object of this exact shape and no other text:
{
  "possibilities": [{"title": string, "description": string, "risk": "low"|"medium"|"high"}],
  "nextSteps": string[],
  "clarifyingQuestions": string[],
  "severity": number,
  "chips": string[]
}
- Give 3-5 possible causes (not diagnoses) with concise descriptions and an appropriate risk.
- Give 3-6 practical, safe next steps (home care vs. urgent care).
- Ask 0-3 clarifying questions (age, duration, severity, key red flags).
- Calibrate severity conservatively from 0 (minimal) to 100 (critical).
- Keep chips short (1-2 words); they are offered to the user as quick replies.

Earlier assistant turns may appear as JSON in this shape; treat them as your own prior answers."#;

/// Builds the context for model requests
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    system_prompt: String,
    limit: usize,
}

impl ContextBuilder {
    /// Create a context builder with the default prompt and limit
    pub fn new() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            limit: DEFAULT_CONTEXT_LIMIT,
        }
    }

    /// Override the number of prior messages kept
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Override the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Flatten the most recent `limit` messages of a session.
    ///
    /// Structured bodies become their JSON form so the model sees its own
    /// prior answer verbatim. Entries with blank text and system entries
    /// are dropped after the window is taken, so the result may be shorter
    /// than `limit`.
    pub fn build_context(session: &Session, limit: usize) -> ContextWindow {
        let messages = session.messages();
        let start = messages.len().saturating_sub(limit);
        let entries = messages[start..].iter().map(|message| ContextEntry {
            role: message.role,
            text: message.flatten(),
        });
        Self::retain_sendable(entries)
    }

    /// Bound caller-supplied history the same way a session is bounded
    pub fn bound_history(history: &[ChatMessage], limit: usize) -> ContextWindow {
        let start = history.len().saturating_sub(limit);
        let entries = history[start..].iter().map(|message| ContextEntry {
            role: message.role,
            text: message.content.clone(),
        });
        Self::retain_sendable(entries)
    }

    fn retain_sendable(entries: impl Iterator<Item = ContextEntry>) -> ContextWindow {
        entries
            .filter(|entry| entry.role != Role::System && !entry.text.trim().is_empty())
            .collect()
    }

    /// Context window for a session using this builder's limit
    pub fn window(&self, session: &Session) -> ContextWindow {
        Self::build_context(session, self.limit)
    }

    /// Build the complete message list for one model call
    pub fn build_messages(&self, window: &[ContextEntry], user_text: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(window.len() + 2);
        messages.push(ChatMessage::system(self.system_prompt.clone()));
        messages.extend(
            window
                .iter()
                .map(|entry| ChatMessage::new(entry.role, entry.text.clone())),
        );
        messages.push(ChatMessage::user(user_text));
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}
