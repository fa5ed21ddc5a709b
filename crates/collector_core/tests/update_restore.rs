use collector_core::{update, ClassifiedMessage, CollectorState, Effect, Msg, PackageId};

fn start_text(name: &str) -> Msg {
    Msg::Ingest {
        message: ClassifiedMessage::Text(format!("[miko] {name}")),
        received_at: 5,
    }
}

#[test]
fn restored_allocator_skips_persisted_ids() {
    let (state, _) = update(
        CollectorState::new(),
        Msg::RestorePackages {
            last_id: Some(PackageId::new(41)),
        },
    );
    let (_, effects) = update(state, start_text("btc"));

    assert_eq!(
        effects,
        vec![Effect::OpenPackage {
            id: PackageId::new(42),
            name: "btc".to_string(),
            created_at: 5,
        }]
    );
}

#[test]
fn restore_never_moves_allocator_backwards() {
    let (state, _) = update(CollectorState::new(), start_text("a"));
    let (state, _) = update(state, start_text("b"));
    let (state, _) = update(
        state,
        Msg::RestorePackages {
            last_id: Some(PackageId::new(1)),
        },
    );
    let (_, effects) = update(state, start_text("c"));

    assert!(matches!(
        effects.as_slice(),
        [Effect::OpenPackage { id, .. }] if *id == PackageId::new(3)
    ));
}

#[test]
fn restore_without_packages_keeps_defaults() {
    let (state, effects) = update(CollectorState::new(), Msg::RestorePackages { last_id: None });

    assert!(effects.is_empty());
    assert_eq!(state, CollectorState::new());
}
