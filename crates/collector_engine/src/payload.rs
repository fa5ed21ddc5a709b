use collector_core::PayloadFields;
use collector_logging::collector_debug;
use serde_json::Value;

use crate::extract::{extract_partial_fields, ExtractionFailure};
use crate::repair::{run_cascade, CascadeOutcome};

/// Parses `text` as a complete payload. Only JSON objects count.
pub fn parse_payload(text: &str) -> Option<PayloadFields> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(object)) => Some(PayloadFields::from_object(object)),
        _ => None,
    }
}

/// Accumulates chunks of one structured-payload candidate and tries to
/// parse after every chunk, falling back to the repair cascade.
#[derive(Debug, Clone, Default)]
pub struct IncrementalPayloadParser {
    buffer: String,
}

impl IncrementalPayloadParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Appends a chunk; returns the payload once the buffer parses.
    pub fn push(&mut self, chunk: &str) -> Option<PayloadFields> {
        self.buffer.push_str(chunk);
        if let Some(fields) = parse_payload(&self.buffer) {
            return Some(fields);
        }
        match run_cascade(&self.buffer) {
            CascadeOutcome::Parsed { fields, step } => {
                collector_debug!("payload parsed after repair step {:?}", step);
                Some(fields)
            }
            CascadeOutcome::Exhausted { .. } => None,
        }
    }

    /// Last attempt at message end: full parse, cascade, then field extraction.
    pub fn finish(self) -> Result<PayloadFields, ExtractionFailure> {
        if let Some(fields) = parse_payload(&self.buffer) {
            return Ok(fields);
        }
        match run_cascade(&self.buffer) {
            CascadeOutcome::Parsed { fields, step } => {
                collector_debug!("payload parsed at message end after repair step {:?}", step);
                Ok(fields)
            }
            CascadeOutcome::Exhausted { repaired } => {
                collector_debug!("repair cascade exhausted, extracting known fields");
                extract_partial_fields(&repaired).map_err(|failure| failure.with_raw(self.buffer))
            }
        }
    }
}
