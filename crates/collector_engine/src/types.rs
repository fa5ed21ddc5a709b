use collector_core::{ClassifiedMessage, Package, PackageId};

/// Result of feeding one chunk to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkStatus {
    /// Nothing deliverable yet.
    Buffering,
    /// Plain text appended by this chunk. The full text is delivered at
    /// message end.
    Text(String),
    /// The message completed and was handed to the lifecycle manager.
    Emitted(ClassifiedMessage),
    /// The message had already completed; the chunk was dropped.
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ItemsUpdated(Vec<ClassifiedMessage>),
    PackageCompleted(Package),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageSelector {
    Id(PackageId),
    Name(String),
}

impl From<PackageId> for PackageSelector {
    fn from(id: PackageId) -> Self {
        PackageSelector::Id(id)
    }
}

impl From<&str> for PackageSelector {
    fn from(name: &str) -> Self {
        PackageSelector::Name(name.to_string())
    }
}

impl From<String> for PackageSelector {
    fn from(name: String) -> Self {
        PackageSelector::Name(name)
    }
}
