//! Stored-record encoding and legacy reconciliation
//!
//! A persisted session is a JSON array of compact records, either
//! `{"role", "structured"}` or `{"role", "content"}`. Older writers stored
//! structured replies as serialized text in `content`; those are promoted
//! back to structured messages on load.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::message::{Message, Role, Session, StructuredResponse};

/// Compact persisted form of one message
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum CompactRecord<'a> {
    Structured {
        role: Role,
        structured: &'a StructuredResponse,
    },
    Freeform {
        role: Role,
        content: &'a str,
    },
}

impl<'a> From<&'a Message> for CompactRecord<'a> {
    fn from(message: &'a Message) -> Self {
        match message.structured_data() {
            Some(structured) => CompactRecord::Structured {
                role: message.role,
                structured,
            },
            None => CompactRecord::Freeform {
                role: message.role,
                content: message.text().unwrap_or_default(),
            },
        }
    }
}

/// Serialize a session to its persisted form
pub fn encode_session(session: &Session) -> crate::Result<String> {
    let records: Vec<CompactRecord<'_>> =
        session.messages().iter().map(CompactRecord::from).collect();
    Ok(serde_json::to_string(&records)?)
}

/// The known shapes a stored entry can take
#[derive(Debug, PartialEq)]
enum StoredShape {
    /// `{"role", "structured": {...}}` written by the current encoder
    Native {
        role: Role,
        structured: StructuredResponse,
    },
    /// `{"role", "content": "<serialized structured JSON>"}` from older writers
    SerializedStructured {
        role: Role,
        structured: StructuredResponse,
    },
    /// `{"role", "content": "<text or markup>"}`
    Text { role: Role, content: String },
    /// `{"role"}` with no usable body, written when content was undefined
    RoleOnly { role: Role },
    /// No known role, or not an object at all
    Unrecognized,
}

fn classify(entry: &Value) -> StoredShape {
    let Some(role) = entry
        .get("role")
        .and_then(Value::as_str)
        .and_then(Role::parse)
    else {
        return StoredShape::Unrecognized;
    };

    if let Some(structured) = entry.get("structured").and_then(StructuredResponse::from_value) {
        return StoredShape::Native { role, structured };
    }

    match entry.get("content").and_then(Value::as_str) {
        Some(content) => match StructuredResponse::from_json_str(content) {
            Some(structured) => StoredShape::SerializedStructured { role, structured },
            None => StoredShape::Text {
                role,
                content: content.to_string(),
            },
        },
        None => StoredShape::RoleOnly { role },
    }
}

/// Reconcile one stored entry into a canonical message
fn reconcile_entry(entry: &Value) -> Option<Message> {
    match classify(entry) {
        StoredShape::Native { role, structured } => Some(Message::structured(role, structured)),
        StoredShape::SerializedStructured { role, structured } => {
            debug!("Promoting serialized structured {} entry", role);
            Some(Message::structured(role, structured))
        }
        StoredShape::Text { role, content } => Some(Message::freeform(role, content)),
        StoredShape::RoleOnly { role } => Some(Message::freeform(role, String::new())),
        StoredShape::Unrecognized => {
            warn!("Dropping unrecognized stored session entry");
            None
        }
    }
}

/// Decode a persisted session.
///
/// Returns `None` when the value is not a JSON array, which callers treat
/// the same as an absent session. Reconciling an already-canonical value
/// yields the same messages it was encoded from.
pub fn decode_session(raw: &str) -> Option<Session> {
    let entries = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            warn!("Persisted session is not an array; ignoring it");
            return None;
        }
        Err(e) => {
            warn!("Persisted session is not valid JSON; ignoring it: {}", e);
            return None;
        }
    };

    let messages = entries.iter().filter_map(reconcile_entry).collect();
    Some(Session::from_messages(messages))
}
