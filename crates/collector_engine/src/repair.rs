//! Ordered, pure text transforms that try to turn a malformed payload
//! buffer into parseable JSON.
//!
//! The cascade is order dependent: each step runs on the output of the
//! previous one and later steps assume earlier ones already ran.

use std::sync::OnceLock;

use collector_core::PayloadFields;
use regex::{Captures, Regex};

use crate::payload::parse_payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairStep {
    /// `word:` becomes `"word":` after `{` or `,`.
    QuoteBareKeys,
    /// Bare words between `:` and `,`/`}` become strings. Numbers and JSON
    /// literals are left alone.
    QuoteBareValues,
    /// Inserts a comma before `}` when the preceding token is not a delimiter.
    InsertMissingComma,
    /// Collapses dot runs to `...` and neutralizes ellipsis tokens that stand
    /// in for a truncated value.
    CollapseEllipses,
    /// Drops control characters and a leading byte-order mark.
    StripControlChars,
    /// Removes a comma directly before `}` or `]`.
    RemoveTrailingCommas,
    /// Cuts the text after the brace that balances the first `{`.
    TruncateAtBalancedBrace,
}

impl RepairStep {
    pub const CASCADE: [RepairStep; 7] = [
        RepairStep::QuoteBareKeys,
        RepairStep::QuoteBareValues,
        RepairStep::InsertMissingComma,
        RepairStep::CollapseEllipses,
        RepairStep::StripControlChars,
        RepairStep::RemoveTrailingCommas,
        RepairStep::TruncateAtBalancedBrace,
    ];

    pub fn apply(self, text: &str) -> String {
        match self {
            RepairStep::QuoteBareKeys => bare_key_re()
                .replace_all(text, r#"${1}"${2}":"#)
                .into_owned(),
            RepairStep::QuoteBareValues => bare_value_re()
                .replace_all(text, |caps: &Captures| {
                    let token = &caps[1];
                    if is_json_scalar(token) {
                        caps[0].to_string()
                    } else {
                        format!(r#":"{token}"{}"#, &caps[2])
                    }
                })
                .into_owned(),
            RepairStep::InsertMissingComma => missing_comma_re()
                .replace_all(text, "${1},${2}}")
                .into_owned(),
            RepairStep::CollapseEllipses => {
                let collapsed = dot_run_re().replace_all(text, "...");
                neutralize_ellipsis_tokens(&collapsed)
            }
            RepairStep::StripControlChars => {
                let trimmed = text.trim_start();
                trimmed
                    .strip_prefix('\u{feff}')
                    .unwrap_or(trimmed)
                    .chars()
                    .filter(|c| !c.is_control())
                    .collect::<String>()
                    .trim()
                    .to_string()
            }
            RepairStep::RemoveTrailingCommas => trailing_comma_re()
                .replace_all(text, "${1}")
                .into_owned(),
            RepairStep::TruncateAtBalancedBrace => {
                if text.trim_end().ends_with('}') {
                    return text.to_string();
                }
                match balanced_object_end(text) {
                    Some(end) => text[..end].to_string(),
                    None => text.to_string(),
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CascadeOutcome {
    Parsed {
        fields: PayloadFields,
        /// The step after which the text first parsed.
        step: RepairStep,
    },
    Exhausted {
        /// Output of the final step.
        repaired: String,
    },
}

/// Runs every step in order, attempting a parse after each one.
pub fn run_cascade(text: &str) -> CascadeOutcome {
    let mut current = text.to_string();
    for step in RepairStep::CASCADE {
        current = step.apply(&current);
        if let Some(fields) = parse_payload(&current) {
            return CascadeOutcome::Parsed { fields, step };
        }
    }
    CascadeOutcome::Exhausted { repaired: current }
}

fn bare_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([{,]\s*)([A-Za-z0-9_]+)\s*:").expect("valid bare key regex"))
}

fn bare_value_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r":\s*([A-Za-z0-9_]+)\s*([,}])").expect("valid bare value regex")
    })
}

fn missing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([^,{\[:\s])(\s*)\}").expect("valid missing comma regex"))
}

fn dot_run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.{3,}").expect("valid ellipsis regex"))
}

fn trailing_comma_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r",\s*([}\]])").expect("valid trailing comma regex"))
}

fn is_json_scalar(token: &str) -> bool {
    matches!(token, "true" | "false" | "null")
        || (token.starts_with(|c: char| c.is_ascii_digit()) && token.parse::<f64>().is_ok())
}

/// Replaces `...` outside string literals: `null` after a colon, removed
/// (with its leading comma) anywhere else.
fn neutralize_ellipsis_tokens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = text;

    while let Some(ch) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if rest.starts_with("...") {
            let kept = out.trim_end().len();
            match out[..kept].chars().last() {
                Some(':') => out.push_str("null"),
                Some(',') => out.truncate(kept - 1),
                _ => {}
            }
            rest = &rest[3..];
            continue;
        } else if ch == '"' {
            in_string = true;
        }
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

/// Byte offset just past the `}` that closes the first top-level `{`.
pub(crate) fn balanced_object_end(text: &str) -> Option<usize> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
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
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return (ch == '}').then_some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}
