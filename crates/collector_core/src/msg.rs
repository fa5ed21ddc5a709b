use crate::{ClassifiedMessage, PackageId};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// A completed, classified message from the chunk pipeline.
    Ingest {
        message: ClassifiedMessage,
        /// Epoch milliseconds at which the message completed.
        received_at: i64,
    },
    /// Packages were loaded from storage; `last_id` is the highest persisted id.
    RestorePackages { last_id: Option<PackageId> },
    /// The consumer deleted a package.
    PackageDeleted { id: PackageId },
    /// The consumer cleared every package.
    ClearAll,
}
