use crate::{ClassifiedMessage, CollectorState, ControlSignal, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: CollectorState, msg: Msg) -> (CollectorState, Vec<Effect>) {
    let effects = match msg {
        Msg::Ingest {
            message,
            received_at,
        } => ingest(&mut state, message, received_at),
        Msg::RestorePackages { last_id } => {
            state.restore_allocator(last_id);
            Vec::new()
        }
        Msg::PackageDeleted { id } => {
            if state.open_package().map(|open| open.id) == Some(id) {
                state.abandon();
            }
            Vec::new()
        }
        Msg::ClearAll => {
            state.abandon();
            Vec::new()
        }
    };

    (state, effects)
}

fn ingest(state: &mut CollectorState, message: ClassifiedMessage, received_at: i64) -> Vec<Effect> {
    match ControlSignal::detect(&message) {
        Some(ControlSignal::Start { name }) => {
            let id = state.open(name.clone());
            return vec![Effect::OpenPackage {
                id,
                name,
                created_at: received_at,
            }];
        }
        Some(ControlSignal::Complete) => {
            if let Some((id, items)) = state.close() {
                return vec![Effect::FinalizePackage { id, items }];
            }
            // Completion while idle is just another idle message.
        }
        None => {}
    }

    if !state.is_collecting() {
        return vec![Effect::Discarded { message }];
    }
    match state.push_item(message) {
        Some((id, items)) => vec![Effect::ItemsAppended { id, items }],
        None => Vec::new(),
    }
}
