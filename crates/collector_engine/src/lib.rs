//! Collector engine: chunk classification, payload repair, package storage
//! and delivery around the pure lifecycle in `collector_core`.
mod classify;
mod command;
mod config;
mod engine;
mod extract;
mod handle;
mod payload;
mod persist;
mod repair;
mod store;
mod subscription;
mod types;

pub use classify::{classify_first_chunk, AccumulatorStep, MessageAccumulator, MessageShape};
pub use command::{CommandError, CommandInvocation, CommandRegistry, DEFAULT_COMMAND_MARKER};
pub use config::{Clock, EngineConfig};
pub use engine::StreamEngine;
pub use extract::{extract_partial_fields, ExtractionFailure};
pub use handle::EngineHandle;
pub use payload::{parse_payload, IncrementalPayloadParser};
pub use persist::{
    ensure_storage_dir, AtomicFileWriter, BlobStore, FileBlobStore, MemoryBlobStore, PersistError,
};
pub use repair::{run_cascade, CascadeOutcome, RepairStep};
pub use store::{PackageStore, PACKAGES_STORAGE_KEY};
pub use subscription::{Subscription, SubscriptionHub};
pub use types::{ChunkStatus, EngineEvent, PackageSelector};
