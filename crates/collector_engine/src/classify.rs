use collector_core::{ClassifiedMessage, TEXT_START_MARKER};

use crate::extract::ExtractionFailure;
use crate::payload::IncrementalPayloadParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageShape {
    Text,
    Payload,
    Command,
}

/// Decides the shape of a logical message from its first non-whitespace
/// character. Returns `None` while there is nothing to look at yet.
pub fn classify_first_chunk(chunk: &str) -> Option<MessageShape> {
    let first = chunk
        .trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .chars()
        .next()?;
    Some(match first {
        '{' => MessageShape::Payload,
        '[' => MessageShape::Command,
        _ => MessageShape::Text,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccumulatorStep {
    /// More input is needed before anything can be delivered.
    Buffering,
    /// Plain text carried by this chunk.
    Text(String),
    /// The message completed with this chunk.
    Completed(ClassifiedMessage),
    /// The message already completed; the chunk was not used.
    Ignored,
}

#[derive(Debug, Clone)]
enum Pending {
    Undecided(String),
    Text(String),
    Payload(IncrementalPayloadParser),
    Command(String),
    Done,
}

impl Pending {
    fn buffered(&self) -> &str {
        match self {
            Pending::Undecided(text) | Pending::Text(text) | Pending::Command(text) => text,
            Pending::Payload(parser) => parser.buffer(),
            Pending::Done => "",
        }
    }
}

/// Per-message accumulator. The shape is fixed by the first meaningful
/// chunk and never revisited until [`MessageAccumulator::finish`].
#[derive(Debug, Clone)]
pub struct MessageAccumulator {
    pending: Pending,
    command_marker: String,
}

impl MessageAccumulator {
    pub fn new(command_marker: impl Into<String>) -> Self {
        Self {
            pending: Pending::Undecided(String::new()),
            command_marker: command_marker.into(),
        }
    }

    pub fn shape(&self) -> Option<MessageShape> {
        match self.pending {
            Pending::Undecided(_) | Pending::Done => None,
            Pending::Text(_) => Some(MessageShape::Text),
            Pending::Payload(_) => Some(MessageShape::Payload),
            Pending::Command(_) => Some(MessageShape::Command),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.pending, Pending::Done)
    }

    pub fn push(&mut self, chunk: &str) -> AccumulatorStep {
        if let Pending::Undecided(prefix) = &mut self.pending {
            prefix.push_str(chunk);
            let Some(shape) = classify_first_chunk(prefix) else {
                return AccumulatorStep::Buffering;
            };
            let seen = std::mem::take(prefix);
            self.pending = match shape {
                MessageShape::Text => Pending::Text(String::new()),
                MessageShape::Payload => Pending::Payload(IncrementalPayloadParser::new()),
                MessageShape::Command => Pending::Command(String::new()),
            };
            return self.feed(&seen);
        }
        self.feed(chunk)
    }

    fn feed(&mut self, chunk: &str) -> AccumulatorStep {
        match &mut self.pending {
            Pending::Undecided(_) => AccumulatorStep::Buffering,
            Pending::Text(text) => {
                text.push_str(chunk);
                AccumulatorStep::Text(chunk.to_string())
            }
            Pending::Payload(parser) => match parser.push(chunk) {
                Some(fields) => {
                    self.pending = Pending::Done;
                    AccumulatorStep::Completed(ClassifiedMessage::StructuredPayload(fields))
                }
                None => AccumulatorStep::Buffering,
            },
            Pending::Command(text) => {
                text.push_str(chunk);
                let trimmed = text.trim();
                // A bare start marker is still waiting for its package name.
                if !trimmed.ends_with(']') || trimmed == TEXT_START_MARKER {
                    return AccumulatorStep::Buffering;
                }
                let text = std::mem::take(text);
                self.pending = Pending::Done;
                AccumulatorStep::Completed(self.close_command(text))
            }
            Pending::Done => AccumulatorStep::Ignored,
        }
    }

    fn close_command(&self, text: String) -> ClassifiedMessage {
        if text.contains(&self.command_marker) {
            ClassifiedMessage::CommandCandidate(text)
        } else {
            ClassifiedMessage::Text(text)
        }
    }

    /// Ends the logical message and resets for the next one.
    ///
    /// Returns the message still owed to the lifecycle manager, if any. When
    /// nothing completed yet and `final_raw` carries different text than was
    /// accumulated, `final_raw` is classified as a single chunk instead.
    pub fn finish(&mut self, final_raw: &str) -> Result<Option<ClassifiedMessage>, ExtractionFailure> {
        let pending = std::mem::replace(&mut self.pending, Pending::Undecided(String::new()));
        if matches!(pending, Pending::Done) {
            return Ok(None);
        }

        let pending = if !final_raw.trim().is_empty() && pending.buffered() != final_raw {
            let mut replay = MessageAccumulator::new(self.command_marker.clone());
            if let AccumulatorStep::Completed(message) = replay.push(final_raw) {
                return Ok(Some(message));
            }
            replay.pending
        } else {
            pending
        };

        match pending {
            Pending::Undecided(_) | Pending::Done => Ok(None),
            // A command that never closed is inert text.
            Pending::Text(text) | Pending::Command(text) => Ok(Some(ClassifiedMessage::Text(text))),
            Pending::Payload(parser) => parser
                .finish()
                .map(|fields| Some(ClassifiedMessage::StructuredPayload(fields))),
        }
    }

    /// Drops whatever was accumulated for the current message.
    pub fn reset(&mut self) {
        self.pending = Pending::Undecided(String::new());
    }
}
