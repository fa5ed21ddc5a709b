use std::io;
use std::sync::{Arc, Mutex};

use collector_core::{ClassifiedMessage, Package, PackageId};
use collector_engine::{
    parse_payload, BlobStore, EngineConfig, MemoryBlobStore, PersistError, StreamEngine,
    PACKAGES_STORAGE_KEY,
};
use pretty_assertions::assert_eq;

const START: &str = r#"{"type":"msg","category":"workflow","data":"$mycoin"}"#;
const DONE: &str = r#"{"type":"msg","category":"workflow","message":"done"}"#;
const TWEETS: &str = r#"{"type":"summary","state":"success","category":"twitter","message":"tweets","data":{"count":3}}"#;

fn engine_with(blobs: &MemoryBlobStore) -> StreamEngine {
    StreamEngine::new(
        EngineConfig::default().with_clock(|| 1_700_000_000_000),
        Box::new(blobs.clone()),
    )
}

/// Sends a whole logical message as one chunk followed by message end.
fn feed(engine: &mut StreamEngine, text: &str) {
    engine.on_chunk(text);
    engine.on_message_end(text);
}

fn payload(text: &str) -> ClassifiedMessage {
    ClassifiedMessage::StructuredPayload(parse_payload(text).expect("valid payload"))
}

fn persisted(blobs: &MemoryBlobStore) -> Option<Vec<Package>> {
    blobs
        .get(PACKAGES_STORAGE_KEY)
        .map(|bytes| serde_json::from_slice(&bytes).expect("persisted packages"))
}

#[test]
fn start_and_complete_bracket_the_items() {
    collector_logging::initialize_for_tests();
    let blobs = MemoryBlobStore::new();
    let mut engine = engine_with(&blobs);

    feed(&mut engine, START);
    assert!(engine.is_collecting());
    feed(&mut engine, TWEETS);
    feed(&mut engine, "plain words");
    feed(&mut engine, DONE);

    assert!(!engine.is_collecting());
    let package = engine.get_package_by_name("mycoin").expect("package");
    assert_eq!(
        package.items,
        vec![
            payload(TWEETS),
            ClassifiedMessage::Text("plain words".to_string())
        ]
    );
    assert!(package.complete);
    assert_eq!(package.created_at, 1_700_000_000_000);
    assert_eq!(persisted(&blobs), Some(vec![package.clone()]));
}

#[test]
fn open_package_mirrors_scratch() {
    collector_logging::initialize_for_tests();
    let blobs = MemoryBlobStore::new();
    let mut engine = engine_with(&blobs);

    feed(&mut engine, START);
    feed(&mut engine, TWEETS);

    let open = engine.get_open_package().expect("open package");
    assert_eq!(open.items, vec![payload(TWEETS)]);
    assert!(!open.complete);
    assert_eq!(persisted(&blobs).unwrap()[0].items.len(), 1);
    assert_eq!(engine.view().scratch_len, 1);
}

#[test]
fn restart_with_same_name_replaces_package() {
    collector_logging::initialize_for_tests();
    let mut engine = engine_with(&MemoryBlobStore::new());

    feed(&mut engine, START);
    feed(&mut engine, "first attempt");
    feed(&mut engine, r##"{"type":"msg","category":"workflow","data":"#mycoin"}"##);
    feed(&mut engine, "second attempt");
    feed(&mut engine, DONE);

    let packages = engine.list_packages();
    assert_eq!(packages.len(), 1);
    assert_eq!(packages[0].id, PackageId::new(2));
    assert_eq!(
        packages[0].items,
        vec![ClassifiedMessage::Text("second attempt".to_string())]
    );
}

#[test]
fn idle_messages_are_dropped() {
    collector_logging::initialize_for_tests();
    let blobs = MemoryBlobStore::new();
    let mut engine = engine_with(&blobs);

    feed(&mut engine, "hello there");
    feed(&mut engine, TWEETS);
    feed(&mut engine, DONE);

    assert!(engine.list_packages().is_empty());
    assert!(!engine.is_collecting());
    assert_eq!(persisted(&blobs), None);
}

#[test]
fn deleting_unknown_package_is_noop() {
    collector_logging::initialize_for_tests();
    let blobs = MemoryBlobStore::new();
    let mut engine = engine_with(&blobs);
    feed(&mut engine, START);
    feed(&mut engine, DONE);
    let before = blobs.get(PACKAGES_STORAGE_KEY);

    engine.delete_package(PackageId::new(99));
    engine.delete_package("nope");

    assert_eq!(engine.list_packages().len(), 1);
    assert_eq!(blobs.get(PACKAGES_STORAGE_KEY), before);
}

#[test]
fn delete_by_id_and_name() {
    collector_logging::initialize_for_tests();
    let mut engine = engine_with(&MemoryBlobStore::new());
    feed(&mut engine, START);
    feed(&mut engine, DONE);
    feed(&mut engine, "[miko] $other");
    feed(&mut engine, DONE);
    assert_eq!(engine.list_packages().len(), 2);

    engine.delete_package("mycoin");
    assert!(engine.get_package_by_name("mycoin").is_none());

    let other = engine.get_package_by_name("other").expect("other").id;
    engine.delete_package(other);
    assert!(engine.list_packages().is_empty());
}

#[test]
fn deleting_open_package_stops_collecting() {
    collector_logging::initialize_for_tests();
    let mut engine = engine_with(&MemoryBlobStore::new());
    feed(&mut engine, START);
    feed(&mut engine, "item");

    engine.delete_package("mycoin");
    assert!(!engine.is_collecting());
    assert!(engine.get_open_package().is_none());

    feed(&mut engine, "late item");
    assert!(engine.list_packages().is_empty());
}

#[test]
fn clear_all_removes_blob_and_open_collection() {
    collector_logging::initialize_for_tests();
    let blobs = MemoryBlobStore::new();
    let mut engine = engine_with(&blobs);
    feed(&mut engine, START);
    feed(&mut engine, "item");
    assert!(blobs.get(PACKAGES_STORAGE_KEY).is_some());

    engine.clear_all();

    assert!(blobs.get(PACKAGES_STORAGE_KEY).is_none());
    assert!(engine.list_packages().is_empty());
    assert!(!engine.is_collecting());
}

#[test]
fn text_marker_starts_collection() {
    collector_logging::initialize_for_tests();
    let mut engine = engine_with(&MemoryBlobStore::new());
    engine.on_chunk("[miko]");
    engine.on_chunk(" $pepe");
    engine.on_message_end("[miko] $pepe");

    assert!(engine.is_collecting());
    assert_eq!(
        engine.get_open_package().map(|p| p.name.as_str()),
        Some("pepe")
    );
}

#[test]
fn subscribers_see_every_append_until_unsubscribed() {
    collector_logging::initialize_for_tests();
    let mut engine = engine_with(&MemoryBlobStore::new());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let completed = Arc::new(Mutex::new(Vec::new()));

    let sink = seen.clone();
    let subscription = engine.subscribe(move |items| sink.lock().unwrap().push(items.len()));
    let sink = completed.clone();
    engine.subscribe_completed(move |package| sink.lock().unwrap().push(package.name.clone()));

    feed(&mut engine, START);
    feed(&mut engine, "one");
    feed(&mut engine, "two");
    subscription.unsubscribe();
    feed(&mut engine, "three");
    feed(&mut engine, DONE);

    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    assert_eq!(*completed.lock().unwrap(), vec!["mycoin".to_string()]);
    assert_eq!(engine.list_packages()[0].items.len(), 3);
}

#[test]
fn commands_execute_and_are_collected() {
    collector_logging::initialize_for_tests();
    let mut engine = engine_with(&MemoryBlobStore::new());
    let calls = Arc::new(Mutex::new(Vec::new()));
    let sink = calls.clone();
    engine.commands_mut().register("info", move |invocation| {
        sink.lock().unwrap().push(invocation.argument.clone());
        Ok(())
    });

    feed(&mut engine, START);
    engine.on_chunk("[mikoCmd:");
    engine.on_chunk("info:btc]");
    engine.on_message_end("[mikoCmd:info:btc]");
    feed(&mut engine, "[mikoCmd:unknown]");
    feed(&mut engine, DONE);

    assert_eq!(*calls.lock().unwrap(), vec![Some("btc".to_string())]);
    assert_eq!(
        engine.list_packages()[0].items,
        vec![
            ClassifiedMessage::CommandCandidate("[mikoCmd:info:btc]".to_string()),
            ClassifiedMessage::CommandCandidate("[mikoCmd:unknown]".to_string()),
        ]
    );
}

#[test]
fn packages_survive_restart() {
    collector_logging::initialize_for_tests();
    let blobs = MemoryBlobStore::new();
    {
        let mut engine = engine_with(&blobs);
        feed(&mut engine, START);
        feed(&mut engine, TWEETS);
        feed(&mut engine, DONE);
    }

    let mut engine = engine_with(&blobs);
    let restored = engine.get_package_by_name("mycoin").expect("restored");
    assert_eq!(restored.items, vec![payload(TWEETS)]);
    assert!(!engine.is_collecting());

    feed(&mut engine, "[miko] fresh");
    assert_eq!(
        engine.get_open_package().map(|p| p.id),
        Some(PackageId::new(2))
    );
}

#[test]
fn corrupt_blob_loads_as_empty() {
    collector_logging::initialize_for_tests();
    let blobs = MemoryBlobStore::new();
    blobs.insert(PACKAGES_STORAGE_KEY, b"not json".to_vec());

    let engine = engine_with(&blobs);
    assert!(engine.list_packages().is_empty());
}

#[test]
fn indented_text_marker_starts_collection() {
    collector_logging::initialize_for_tests();
    let mut engine = engine_with(&MemoryBlobStore::new());
    feed(&mut engine, " [miko] btc");

    assert!(engine.is_collecting());
    assert_eq!(
        engine.get_open_package().map(|p| p.name.as_str()),
        Some("btc")
    );
}

/// Storage that is never available.
struct FailingBlobStore;

fn unavailable() -> PersistError {
    PersistError::Io(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
}

impl BlobStore for FailingBlobStore {
    fn load_blob(&self, _key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Err(unavailable())
    }

    fn save_blob(&mut self, _key: &str, _bytes: &[u8]) -> Result<(), PersistError> {
        Err(unavailable())
    }

    fn remove_blob(&mut self, _key: &str) -> Result<(), PersistError> {
        Err(unavailable())
    }
}

#[test]
fn storage_failures_keep_memory_authoritative() {
    collector_logging::initialize_for_tests();
    let mut engine = StreamEngine::new(
        EngineConfig::default().with_clock(|| 5),
        Box::new(FailingBlobStore),
    );
    assert!(engine.list_packages().is_empty());

    let completed = Arc::new(Mutex::new(Vec::new()));
    let sink = completed.clone();
    engine.subscribe_completed(move |package| sink.lock().unwrap().push(package.id));

    feed(&mut engine, START);
    feed(&mut engine, TWEETS);
    assert_eq!(engine.get_open_package().map(|p| p.items.len()), Some(1));
    feed(&mut engine, DONE);

    let package = engine.get_package_by_name("mycoin").expect("kept in memory");
    assert!(package.complete);
    assert_eq!(package.items, vec![payload(TWEETS)]);
    assert_eq!(*completed.lock().unwrap(), vec![PackageId::new(1)]);

    engine.clear_all();
    assert!(engine.list_packages().is_empty());
    assert!(!engine.is_collecting());

    feed(&mut engine, "[miko] again");
    assert_eq!(
        engine.get_open_package().map(|p| p.id),
        Some(PackageId::new(2))
    );
}
