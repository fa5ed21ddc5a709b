use crate::ClassifiedMessage;

/// Category that marks a structured payload as a potential control signal.
pub const WORKFLOW_CATEGORY: &str = "workflow";
/// `message` value of a workflow payload that closes the open package.
pub const COMPLETE_MESSAGE: &str = "done";
/// Leading marker of the plain-text start signal, `"[miko] <name>"`.
/// Leading whitespace before the marker is ignored.
pub const TEXT_START_MARKER: &str = "[miko]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlSignal {
    Start { name: String },
    Complete,
}

impl ControlSignal {
    /// Interprets a classified message as a control signal, if it is one.
    ///
    /// Complete is only reported here by shape; whether it applies depends on
    /// the collector being in the collecting state.
    pub fn detect(message: &ClassifiedMessage) -> Option<Self> {
        match message {
            ClassifiedMessage::StructuredPayload(fields) if fields.is_category(WORKFLOW_CATEGORY) => {
                if let Some(data) = fields.data_text() {
                    return Some(ControlSignal::Start {
                        name: normalize_package_name(data),
                    });
                }
                if fields.message.as_deref() == Some(COMPLETE_MESSAGE) {
                    return Some(ControlSignal::Complete);
                }
                None
            }
            ClassifiedMessage::Text(text) => {
                let rest = text.trim_start().strip_prefix(TEXT_START_MARKER)?.trim();
                if rest.is_empty() {
                    return None;
                }
                Some(ControlSignal::Start {
                    name: normalize_package_name(rest),
                })
            }
            _ => None,
        }
    }
}

/// Strips surrounding whitespace and a single leading `$` or `#` marker.
pub fn normalize_package_name(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix('$')
        .or_else(|| trimmed.strip_prefix('#'))
        .unwrap_or(trimmed)
        .to_string()
}
