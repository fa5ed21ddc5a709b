use std::fmt;
use std::sync::Arc;

use crate::command::DEFAULT_COMMAND_MARKER;
use crate::store::PACKAGES_STORAGE_KEY;

/// Epoch milliseconds source used to stamp packages.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

#[derive(Clone)]
pub struct EngineConfig {
    pub storage_key: String,
    pub command_marker: String,
    pub clock: Clock,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storage_key: PACKAGES_STORAGE_KEY.to_string(),
            command_marker: DEFAULT_COMMAND_MARKER.to_string(),
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }
}

impl EngineConfig {
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("storage_key", &self.storage_key)
            .field("command_marker", &self.command_marker)
            .finish_non_exhaustive()
    }
}
