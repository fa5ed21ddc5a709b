use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One complete logical message after classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", content = "content", rename_all = "snake_case")]
pub enum ClassifiedMessage {
    /// Plain prose, concatenated verbatim.
    Text(String),
    /// A structured payload, parsed directly or recovered by repair/extraction.
    StructuredPayload(PayloadFields),
    /// A bracketed command carrying the command namespace marker.
    CommandCandidate(String),
}

impl ClassifiedMessage {
    pub fn as_payload(&self) -> Option<&PayloadFields> {
        match self {
            ClassifiedMessage::StructuredPayload(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ClassifiedMessage::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Known top-level payload fields plus a catch-all for everything else.
///
/// `kind` travels under the wire key `"type"`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct PayloadFields {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PayloadFields {
    /// Splits a parsed JSON object into the known fields and the catch-all.
    ///
    /// Known keys whose value is not a string stay in `extra` so nothing
    /// from the source object is lost. A `null` data value counts as absent.
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let kind = take_string(&mut object, "type");
        let state = take_string(&mut object, "state");
        let category = take_string(&mut object, "category");
        let message = take_string(&mut object, "message");
        let data = match object.remove("data") {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        };
        Self {
            kind,
            state,
            category,
            message,
            data,
            extra: object,
        }
    }

    pub fn is_category(&self, category: &str) -> bool {
        self.category.as_deref() == Some(category)
    }

    /// Returns `data` when it is a string with non-blank content.
    pub fn data_text(&self) -> Option<&str> {
        match &self.data {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for PayloadFields {
    fn from(object: Map<String, Value>) -> Self {
        Self::from_object(object)
    }
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    if !matches!(object.get(key), Some(Value::String(_))) {
        return None;
    }
    match object.remove(key) {
        Some(Value::String(text)) => Some(text),
        _ => None,
    }
}
