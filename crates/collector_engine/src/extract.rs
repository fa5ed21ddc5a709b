//! Best-effort recovery of the known payload fields from text that no
//! longer parses as a whole.

use std::sync::OnceLock;

use collector_core::PayloadFields;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// The four string fields that must all be present for a recovery.
const REQUIRED_FIELDS: [&str; 4] = ["type", "state", "category", "message"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecoverable payload, missing fields {missing:?}")]
pub struct ExtractionFailure {
    pub missing: Vec<&'static str>,
    /// The raw buffer the payload was accumulated from.
    pub raw: String,
}

impl ExtractionFailure {
    pub(crate) fn with_raw(mut self, raw: String) -> Self {
        self.raw = raw;
        self
    }
}

pub fn extract_partial_fields(text: &str) -> Result<PayloadFields, ExtractionFailure> {
    let patterns = field_patterns();
    let mut values = Vec::with_capacity(REQUIRED_FIELDS.len());
    let mut missing = Vec::new();

    for (key, pattern) in REQUIRED_FIELDS.iter().zip(patterns.iter()) {
        let value = pattern
            .captures(text)
            .and_then(|caps| serde_json::from_str::<String>(&caps[1]).ok());
        match value {
            Some(value) => values.push(value),
            None => missing.push(*key),
        }
    }

    if !missing.is_empty() {
        return Err(ExtractionFailure {
            missing,
            raw: text.to_string(),
        });
    }

    let mut values = values.into_iter();
    Ok(PayloadFields {
        kind: values.next(),
        state: values.next(),
        category: values.next(),
        message: values.next(),
        data: extract_data(text),
        ..PayloadFields::default()
    })
}

fn field_patterns() -> &'static [Regex; 4] {
    static PATTERNS: OnceLock<[Regex; 4]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        REQUIRED_FIELDS.map(|key| {
            Regex::new(&format!(r#""{key}"\s*:\s*("(?:[^"\\]|\\.)*")"#))
                .expect("valid field regex")
        })
    })
}

fn data_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""data"\s*:\s*"#).expect("valid data key regex"))
}

/// Locates the `data` value and parses it on its own. Any failure omits it.
fn extract_data(text: &str) -> Option<Value> {
    let key = data_key_re().find(text)?;
    let rest = &text[key.end()..];
    let literal = value_span(rest)?;
    match serde_json::from_str::<Value>(literal) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

fn value_span(rest: &str) -> Option<&str> {
    match rest.chars().next()? {
        '{' | '[' => balanced_span(rest),
        '"' => string_span(rest),
        _ => {
            let end = rest
                .find(|c: char| matches!(c, ',' | '}' | ']') || c.is_whitespace())
                .unwrap_or(rest.len());
            (end > 0).then(|| &rest[..end])
        }
    }
}

/// Scans forward tracking quotes and bracket depth until the value closes.
fn balanced_span(rest: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in rest.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&rest[..idx + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

fn string_span(rest: &str) -> Option<&str> {
    let mut escaped = false;
    for (idx, ch) in rest.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return Some(&rest[..=idx]);
        }
    }
    None
}
