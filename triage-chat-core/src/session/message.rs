//! Conversation message model

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Fields that must be present as arrays for a value to count as a structured response
const REQUIRED_SEQUENCES: [&str; 3] = ["possibilities", "nextSteps", "clarifyingQuestions"];

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse a wire name, returning `None` for anything unknown
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "system" => Some(Role::System),
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Risk attached to one possibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    Low,
    #[default]
    Medium,
    High,
}

impl Risk {
    pub fn as_str(&self) -> &'static str {
        match self {
            Risk::Low => "low",
            Risk::Medium => "medium",
            Risk::High => "high",
        }
    }

    /// Generators drift on casing and synonyms; anything unrecognised is medium
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Risk::Low,
            "high" => Risk::High,
            _ => Risk::Medium,
        }
    }
}

impl<'de> Deserialize<'de> for Risk {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(Risk::from_label(&raw))
    }
}

/// One candidate explanation for the described symptoms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Possibility {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub risk: Risk,
}

impl Possibility {
    /// Lenient decode of one array element; a bare string is taken as the title
    fn from_item(item: &Value) -> Option<Self> {
        match item {
            Value::Null => None,
            Value::Object(obj) => Some(Self {
                title: field_text(obj, "title"),
                description: field_text(obj, "description"),
                risk: obj
                    .get("risk")
                    .and_then(Value::as_str)
                    .map(Risk::from_label)
                    .unwrap_or_default(),
            }),
            other => Some(Self {
                title: item_text(other)?,
                description: String::new(),
                risk: Risk::default(),
            }),
        }
    }
}

/// Canonical clinical-summary shape produced by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredResponse {
    pub possibilities: Vec<Possibility>,
    pub next_steps: Vec<String>,
    pub clarifying_questions: Vec<String>,
    /// Raw severity as emitted; read through [`StructuredResponse::severity_level`]
    #[serde(deserialize_with = "deserialize_severity")]
    pub severity: i64,
    #[serde(default)]
    pub chips: Vec<String>,
}

impl StructuredResponse {
    /// Decode a JSON value if it has the structured shape.
    ///
    /// The check is structural: the three sequence fields must be arrays and
    /// `severity` must be a number. Past that, elements are read leniently:
    /// null items are skipped, non-string items keep their JSON text, and
    /// a missing or non-array `chips` is empty. Extra fields are ignored.
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let has_sequences = REQUIRED_SEQUENCES
            .iter()
            .all(|key| obj.get(*key).is_some_and(Value::is_array));
        let severity = obj.get("severity").and_then(Value::as_number);
        let (true, Some(severity)) = (has_sequences, severity) else {
            return None;
        };

        Some(Self {
            possibilities: array_items(obj, "possibilities")
                .filter_map(Possibility::from_item)
                .collect(),
            next_steps: text_items(obj, "nextSteps"),
            clarifying_questions: text_items(obj, "clarifyingQuestions"),
            severity: severity_from_number(severity),
            chips: text_items(obj, "chips"),
        })
    }

    /// Parse a JSON document and decode it if it has the structured shape
    pub fn from_json_str(text: &str) -> Option<Self> {
        serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|value| Self::from_value(&value))
    }

    /// Severity clamped to `0..=100`; every display path reads this
    pub fn severity_level(&self) -> u8 {
        self.severity.clamp(0, 100) as u8
    }

    /// Compact JSON form, as persisted and as echoed back to the model
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

fn deserialize_severity<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let number = Number::deserialize(deserializer)?;
    Ok(severity_from_number(&number))
}

fn severity_from_number(number: &Number) -> i64 {
    if let Some(v) = number.as_i64() {
        return v;
    }
    if let Some(v) = number.as_u64() {
        return i64::try_from(v).unwrap_or(i64::MAX);
    }
    // float to int casts saturate; NaN cannot appear in JSON
    number.as_f64().map(|v| v.round() as i64).unwrap_or_default()
}

fn array_items<'a>(obj: &'a Map<String, Value>, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn text_items(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    array_items(obj, key).filter_map(item_text).collect()
}

/// Strings as-is, null as absent, anything else as its JSON text
fn item_text(item: &Value) -> Option<String> {
    match item {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn field_text(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).and_then(item_text).unwrap_or_default()
}

/// Content of a message: exactly one variant is populated
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Plain text or pre-rendered markup
    Freeform { text: String },
    /// Clinical summary
    Structured { data: StructuredResponse },
}

/// One conversational turn
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub role: Role,
    pub body: Body,
}

impl Message {
    /// Create a freeform message
    pub fn freeform(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            body: Body::Freeform { text: text.into() },
        }
    }

    /// Create a structured message
    pub fn structured(role: Role, data: StructuredResponse) -> Self {
        Self {
            role,
            body: Body::Structured { data },
        }
    }

    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        Self::freeform(Role::User, text)
    }

    /// Create an assistant text message
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::freeform(Role::Assistant, text)
    }

    pub fn is_structured(&self) -> bool {
        matches!(self.body, Body::Structured { .. })
    }

    /// Freeform text, if this is a freeform message
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Freeform { text } => Some(text),
            Body::Structured { .. } => None,
        }
    }

    /// Structured data, if this is a structured message
    pub fn structured_data(&self) -> Option<&StructuredResponse> {
        match &self.body {
            Body::Structured { data } => Some(data),
            Body::Freeform { .. } => None,
        }
    }

    /// Flatten the body to text: structured data becomes its JSON form
    pub fn flatten(&self) -> String {
        match &self.body {
            Body::Freeform { text } => text.clone(),
            Body::Structured { data } => data.to_json(),
        }
    }
}

/// Ordered sequence of messages; insertion order is conversational order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    messages: Vec<Message>,
}

impl Session {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session from already-ordered messages
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    /// Append a message
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Remove all messages
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Most recent structured reply, if any
    pub fn last_structured(&self) -> Option<&StructuredResponse> {
        self.messages
            .iter()
            .rev()
            .find_map(Message::structured_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_value(severity: Value) -> Value {
        json!({
            "possibilities": [
                {"title": "Tension headache", "description": "Muscle tightness", "risk": "low"}
            ],
            "nextSteps": ["Rest", "Hydrate", "Track symptoms"],
            "clarifyingQuestions": ["How long has it lasted?"],
            "severity": severity,
            "chips": ["Fever", "Nausea"]
        })
    }

    #[test]
    fn test_from_value_accepts_shape() {
        let parsed = StructuredResponse::from_value(&sample_value(json!(40))).unwrap();
        assert_eq!(parsed.possibilities.len(), 1);
        assert_eq!(parsed.possibilities[0].risk, Risk::Low);
        assert_eq!(parsed.next_steps.len(), 3);
        assert_eq!(parsed.severity, 40);
        assert_eq!(parsed.chips, vec!["Fever", "Nausea"]);
    }

    #[test]
    fn test_from_value_ignores_extra_fields_and_defaults_chips() {
        let value = json!({
            "possibilities": [],
            "nextSteps": [],
            "clarifyingQuestions": [],
            "severity": 10,
            "disclaimer": "not medical advice"
        });
        let parsed = StructuredResponse::from_value(&value).unwrap();
        assert!(parsed.chips.is_empty());
    }

    #[test]
    fn test_from_value_rejects_missing_or_mistyped_fields() {
        let mut missing = sample_value(json!(40));
        missing.as_object_mut().unwrap().remove("nextSteps");
        assert!(StructuredResponse::from_value(&missing).is_none());

        assert!(StructuredResponse::from_value(&sample_value(json!("40"))).is_none());

        let mut not_array = sample_value(json!(40));
        not_array["clarifyingQuestions"] = json!("none");
        assert!(StructuredResponse::from_value(&not_array).is_none());

        assert!(StructuredResponse::from_value(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_bare_string_possibility_becomes_title() {
        let mut value = sample_value(json!(30));
        value["possibilities"] = json!(["Common cold", null]);
        let parsed = StructuredResponse::from_value(&value).unwrap();
        assert_eq!(
            parsed.possibilities,
            vec![Possibility {
                title: "Common cold".to_string(),
                description: String::new(),
                risk: Risk::Medium,
            }]
        );
    }

    #[test]
    fn test_null_or_missing_possibility_fields_are_empty() {
        let mut value = sample_value(json!(30));
        value["possibilities"] = json!([
            {"title": "Sinusitis", "description": null, "risk": 3},
            {"description": "No title"}
        ]);
        let parsed = StructuredResponse::from_value(&value).unwrap();
        assert_eq!(parsed.possibilities[0].description, "");
        assert_eq!(parsed.possibilities[0].risk, Risk::Medium);
        assert_eq!(parsed.possibilities[1].title, "");
        assert_eq!(parsed.possibilities[1].description, "No title");
    }

    #[test]
    fn test_non_string_list_items_keep_json_text() {
        let mut value = sample_value(json!(30));
        value["nextSteps"] = json!([{"step": "Rest"}, "Hydrate", null]);
        value["clarifyingQuestions"] = json!([7]);
        value["chips"] = json!([true, "Fever"]);
        let parsed = StructuredResponse::from_value(&value).unwrap();
        assert_eq!(parsed.next_steps, vec![r#"{"step":"Rest"}"#, "Hydrate"]);
        assert_eq!(parsed.clarifying_questions, vec!["7"]);
        assert_eq!(parsed.chips, vec!["true", "Fever"]);
    }

    #[test]
    fn test_null_or_non_array_chips_are_empty() {
        for chips in [json!(null), json!("Fever"), json!({"a": 1})] {
            let mut value = sample_value(json!(30));
            value["chips"] = chips;
            let parsed = StructuredResponse::from_value(&value).unwrap();
            assert!(parsed.chips.is_empty());
        }
    }

    #[test]
    fn test_severity_clamping() {
        let cases = [(-50, 0u8), (0, 0), (55, 55), (100, 100), (300, 100)];
        for (raw, expected) in cases {
            let parsed = StructuredResponse::from_value(&sample_value(json!(raw))).unwrap();
            assert_eq!(parsed.severity, raw);
            assert_eq!(parsed.severity_level(), expected, "severity {}", raw);
        }
    }

    #[test]
    fn test_fractional_severity_rounds() {
        let parsed = StructuredResponse::from_value(&sample_value(json!(54.6))).unwrap();
        assert_eq!(parsed.severity, 55);
    }

    #[test]
    fn test_risk_is_lenient() {
        let value = json!({
            "possibilities": [
                {"title": "A", "description": "a", "risk": "HIGH"},
                {"title": "B", "description": "b", "risk": "moderate"},
                {"title": "C", "description": "c"}
            ],
            "nextSteps": [],
            "clarifyingQuestions": [],
            "severity": 70
        });
        let parsed = StructuredResponse::from_value(&value).unwrap();
        let risks: Vec<Risk> = parsed.possibilities.iter().map(|p| p.risk).collect();
        assert_eq!(risks, vec![Risk::High, Risk::Medium, Risk::Medium]);
    }

    #[test]
    fn test_to_json_uses_camel_case() {
        let parsed = StructuredResponse::from_value(&sample_value(json!(40))).unwrap();
        let encoded = parsed.to_json();
        assert!(encoded.contains("\"nextSteps\""));
        assert!(encoded.contains("\"clarifyingQuestions\""));
        assert_eq!(StructuredResponse::from_json_str(&encoded), Some(parsed));
    }

    #[test]
    fn test_message_accessors() {
        let text = Message::user("I have a headache");
        assert_eq!(text.text(), Some("I have a headache"));
        assert!(text.structured_data().is_none());
        assert_eq!(text.flatten(), "I have a headache");

        let data = StructuredResponse::from_value(&sample_value(json!(40))).unwrap();
        let structured = Message::structured(Role::Assistant, data.clone());
        assert!(structured.is_structured());
        assert!(structured.text().is_none());
        assert_eq!(structured.flatten(), data.to_json());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("tool"), None);
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_last_structured() {
        let data = StructuredResponse::from_value(&sample_value(json!(40))).unwrap();
        let mut session = Session::new();
        assert!(session.last_structured().is_none());

        session.push(Message::user("first"));
        session.push(Message::structured(Role::Assistant, data.clone()));
        session.push(Message::user("follow-up"));
        session.push(Message::assistant("plain reply"));

        assert_eq!(session.last_structured(), Some(&data));
    }
}
