use std::sync::Once;

use collector_core::{
    update, ClassifiedMessage, CollectorPhase, CollectorState, Effect, Msg, PackageId,
    PayloadFields,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(collector_logging::initialize_for_tests);
}

fn payload(value: serde_json::Value) -> ClassifiedMessage {
    match value {
        serde_json::Value::Object(map) => {
            ClassifiedMessage::StructuredPayload(PayloadFields::from_object(map))
        }
        other => panic!("expected object, got {other}"),
    }
}

fn start(name: &str) -> ClassifiedMessage {
    payload(json!({"type": "msg", "category": "workflow", "data": name}))
}

fn done() -> ClassifiedMessage {
    payload(json!({"type": "msg", "category": "workflow", "message": "done"}))
}

fn ingest(state: CollectorState, message: ClassifiedMessage) -> (CollectorState, Vec<Effect>) {
    update(
        state,
        Msg::Ingest {
            message,
            received_at: 1_000,
        },
    )
}

#[test]
fn start_opens_package_with_stripped_name() {
    init_logging();
    let (state, effects) = ingest(CollectorState::new(), start("$mycoin"));

    assert_eq!(state.phase(), CollectorPhase::Collecting);
    assert_eq!(
        effects,
        vec![Effect::OpenPackage {
            id: PackageId::new(1),
            name: "mycoin".to_string(),
            created_at: 1_000,
        }]
    );
    assert!(state.scratch().is_empty());
}

#[test]
fn items_between_start_and_complete_are_finalized_in_order() {
    init_logging();
    let m1 = payload(json!({"type": "summary", "state": "success", "category": "twitter"}));
    let m2 = ClassifiedMessage::Text("some prose".to_string());
    let m3 = ClassifiedMessage::CommandCandidate("[mikoCmd:info]".to_string());

    let (state, _) = ingest(CollectorState::new(), start("#btc"));
    let (state, effects) = ingest(state, m1.clone());
    assert_eq!(
        effects,
        vec![Effect::ItemsAppended {
            id: PackageId::new(1),
            items: vec![m1.clone()],
        }]
    );
    let (state, _) = ingest(state, m2.clone());
    let (state, effects) = ingest(state, m3.clone());
    assert_eq!(state.scratch().len(), 3);
    assert_eq!(
        effects,
        vec![Effect::ItemsAppended {
            id: PackageId::new(1),
            items: vec![m1.clone(), m2.clone(), m3.clone()],
        }]
    );

    let (state, effects) = ingest(state, done());
    assert_eq!(
        effects,
        vec![Effect::FinalizePackage {
            id: PackageId::new(1),
            items: vec![m1, m2, m3],
        }]
    );
    assert!(!state.is_collecting());
    assert!(state.scratch().is_empty());
}

#[test]
fn idle_messages_are_discarded() {
    init_logging();
    let text = ClassifiedMessage::Text("hello".to_string());
    let (state, effects) = ingest(CollectorState::new(), text.clone());

    assert_eq!(effects, vec![Effect::Discarded { message: text }]);
    assert_eq!(state, CollectorState::new());
}

#[test]
fn complete_while_idle_is_discarded() {
    init_logging();
    let (state, effects) = ingest(CollectorState::new(), done());

    assert_eq!(effects, vec![Effect::Discarded { message: done() }]);
    assert!(!state.is_collecting());
}

#[test]
fn restart_with_same_name_allocates_new_package() {
    init_logging();
    let (state, _) = ingest(CollectorState::new(), start("$eth"));
    let (state, _) = ingest(state, ClassifiedMessage::Text("partial".to_string()));
    let (state, effects) = ingest(state, start("eth"));

    assert_eq!(
        effects,
        vec![Effect::OpenPackage {
            id: PackageId::new(2),
            name: "eth".to_string(),
            created_at: 1_000,
        }]
    );
    assert!(state.scratch().is_empty());
    assert_eq!(state.open_package().map(|open| open.id), Some(PackageId::new(2)));
}

#[test]
fn unknown_workflow_shape_is_an_ordinary_item() {
    init_logging();
    let odd = payload(json!({"type": "msg", "category": "workflow", "message": "running"}));
    let (state, _) = ingest(CollectorState::new(), start("sol"));
    let (state, effects) = ingest(state, odd.clone());

    assert_eq!(
        effects,
        vec![Effect::ItemsAppended {
            id: PackageId::new(1),
            items: vec![odd],
        }]
    );
    assert!(state.is_collecting());
}

#[test]
fn text_marker_opens_package() {
    init_logging();
    let (state, effects) = ingest(
        CollectorState::new(),
        ClassifiedMessage::Text("[miko] $doge".to_string()),
    );

    assert!(state.is_collecting());
    assert_eq!(
        effects,
        vec![Effect::OpenPackage {
            id: PackageId::new(1),
            name: "doge".to_string(),
            created_at: 1_000,
        }]
    );
}

#[test]
fn deleting_other_package_leaves_state_untouched() {
    init_logging();
    let (idle, _) = update(
        CollectorState::new(),
        Msg::PackageDeleted {
            id: PackageId::new(3),
        },
    );
    assert_eq!(idle, CollectorState::new());

    let (state, _) = ingest(CollectorState::new(), start("ada"));
    let (state, _) = ingest(state, ClassifiedMessage::Text("x".to_string()));
    let (next, effects) = update(
        state.clone(),
        Msg::PackageDeleted {
            id: PackageId::new(7),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(next, state);
}

#[test]
fn deleting_open_package_returns_to_idle() {
    init_logging();
    let (state, _) = ingest(CollectorState::new(), start("ada"));
    let (state, _) = ingest(state, ClassifiedMessage::Text("x".to_string()));

    let (state, effects) = update(
        state,
        Msg::PackageDeleted {
            id: PackageId::new(9),
        },
    );
    assert!(effects.is_empty());
    assert!(state.is_collecting());

    let (state, _) = update(
        state,
        Msg::PackageDeleted {
            id: PackageId::new(1),
        },
    );
    assert!(!state.is_collecting());
    assert!(state.scratch().is_empty());
}

#[test]
fn clear_all_resets_collector() {
    init_logging();
    let (state, _) = ingest(CollectorState::new(), start("ada"));
    let (state, _) = update(state, Msg::ClearAll);

    let view = state.view();
    assert_eq!(view.phase, CollectorPhase::Idle);
    assert_eq!(view.open_package, None);
    assert_eq!(view.scratch_len, 0);
}
