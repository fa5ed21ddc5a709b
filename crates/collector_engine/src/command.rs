use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Namespace marker identifying real commands, as in `[mikoCmd:info]`.
pub const DEFAULT_COMMAND_MARKER: &str = "mikoCmd";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    pub name: String,
    pub argument: Option<String>,
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("malformed command {0:?}")]
    Malformed(String),
    #[error("no handler registered for command {0:?}")]
    Unknown(String),
    #[error("command {name} failed: {reason}")]
    Failed { name: String, reason: String },
}

type CommandHandler = Box<dyn FnMut(&CommandInvocation) -> Result<(), String> + Send>;

/// Handlers for `[<marker>:<name>]` and `[<marker>:<name>:<argument>]`.
pub struct CommandRegistry {
    marker: String,
    handlers: HashMap<String, CommandHandler>,
}

impl CommandRegistry {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
            handlers: HashMap::new(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Registers (or replaces) the handler for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: FnMut(&CommandInvocation) -> Result<(), String> + Send + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn parse(&self, text: &str) -> Option<CommandInvocation> {
        let raw = text.trim();
        let body = raw
            .strip_prefix('[')?
            .strip_suffix(']')?
            .strip_prefix(self.marker.as_str())?
            .strip_prefix(':')?;
        let (name, argument) = match body.split_once(':') {
            Some((name, argument)) => (name, Some(argument.to_string())),
            None => (body, None),
        };
        if name.is_empty() {
            return None;
        }
        Some(CommandInvocation {
            name: name.to_string(),
            argument,
            raw: raw.to_string(),
        })
    }

    pub fn execute(&mut self, text: &str) -> Result<(), CommandError> {
        let invocation = self
            .parse(text)
            .ok_or_else(|| CommandError::Malformed(text.to_string()))?;
        let handler = self
            .handlers
            .get_mut(&invocation.name)
            .ok_or_else(|| CommandError::Unknown(invocation.name.clone()))?;
        handler(&invocation).map_err(|reason| CommandError::Failed {
            name: invocation.name.clone(),
            reason,
        })
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_MARKER)
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.handlers.keys().collect();
        names.sort();
        f.debug_struct("CommandRegistry")
            .field("marker", &self.marker)
            .field("handlers", &names)
            .finish()
    }
}
