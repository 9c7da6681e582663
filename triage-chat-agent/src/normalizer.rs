//! Response normalization: classify a raw model reply into a canonical message
//!
//! The cascade never fails. In order:
//! 1. a JSON object with the structured shape is wrapped as structured;
//! 2. a string that parses as such an object is wrapped as structured;
//! 3. anything else is rendered to markup and wrapped as freeform;
//! 4. a missing payload becomes a freeform apology.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::debug;
use triage_chat_core::session::{Body, Message, Role, StructuredResponse};

use crate::markup::{MarkdownFormatter, MarkupFormatter};

/// Text shown when no reply could be obtained from the model
pub const APOLOGY_TEXT: &str =
    "Sorry, something went wrong while checking your symptoms. Please try again in a moment.";

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z0-9_-]*\s*\n(.*?)\n?```$").expect("valid regex"));

/// Turns raw model output into a canonical assistant [`Message`]
pub struct ResponseNormalizer {
    formatter: Box<dyn MarkupFormatter>,
}

impl ResponseNormalizer {
    /// Create a normalizer with a custom markup formatter
    pub fn new(formatter: impl MarkupFormatter + 'static) -> Self {
        Self {
            formatter: Box::new(formatter),
        }
    }

    /// Normalize a raw payload; `None` means the model call produced nothing
    pub fn normalize(&self, raw: Option<&Value>) -> Message {
        let body = match raw {
            None | Some(Value::Null) => {
                debug!("No raw payload, using apology text");
                Body::Freeform {
                    text: APOLOGY_TEXT.to_string(),
                }
            }
            Some(value) => self.classify(value),
        };

        Message {
            role: Role::Assistant,
            body,
        }
    }

    /// Convenience for payloads already known to be text
    pub fn normalize_text(&self, raw: &str) -> Message {
        self.normalize(Some(&Value::String(raw.to_string())))
    }

    fn classify(&self, value: &Value) -> Body {
        if let Some(data) = StructuredResponse::from_value(value) {
            debug!("Raw payload is a structured object");
            return Body::Structured { data };
        }

        let text = match value {
            Value::String(text) => {
                if let Some(data) = parse_structured_text(text) {
                    debug!("Raw payload is serialized structured JSON");
                    return Body::Structured { data };
                }
                text.clone()
            }
            other => other.to_string(),
        };

        debug!("Raw payload is narrative text ({} chars)", text.len());
        Body::Freeform {
            text: self.formatter.render(&text),
        }
    }
}

impl Default for ResponseNormalizer {
    fn default() -> Self {
        Self::new(MarkdownFormatter)
    }
}

/// Parse text as structured JSON, also accepting a single fenced code block
fn parse_structured_text(text: &str) -> Option<StructuredResponse> {
    let trimmed = text.trim();
    StructuredResponse::from_json_str(trimmed).or_else(|| {
        CODE_FENCE
            .captures(trimmed)
            .and_then(|caps| caps.get(1))
            .and_then(|inner| StructuredResponse::from_json_str(inner.as_str()))
    })
}
