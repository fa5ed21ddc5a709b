use collector_core::{
    update, ClassifiedMessage, CollectorState, CollectorView, Effect, Msg, Package, PackageId,
};
use collector_logging::{
    collector_debug, collector_error, collector_info, collector_warn, set_message_seq,
};

use crate::classify::{AccumulatorStep, MessageAccumulator};
use crate::command::CommandRegistry;
use crate::config::EngineConfig;
use crate::persist::BlobStore;
use crate::store::PackageStore;
use crate::subscription::{Subscription, SubscriptionHub};
use crate::{ChunkStatus, PackageSelector};

/// Synchronous streaming engine: chunks in, packages out.
///
/// Calls must be serialized by the host; see [`crate::EngineHandle`] for a
/// queue-backed wrapper.
pub struct StreamEngine {
    config: EngineConfig,
    accumulator: MessageAccumulator,
    state: CollectorState,
    store: PackageStore,
    hub: SubscriptionHub,
    commands: CommandRegistry,
    message_seq: u64,
    message_open: bool,
}

impl StreamEngine {
    pub fn new(config: EngineConfig, blobs: Box<dyn BlobStore>) -> Self {
        let store = PackageStore::load(blobs, config.storage_key.clone());
        let (state, _) = update(
            CollectorState::new(),
            Msg::RestorePackages {
                last_id: store.last_id(),
            },
        );
        Self {
            accumulator: MessageAccumulator::new(config.command_marker.clone()),
            commands: CommandRegistry::new(config.command_marker.clone()),
            config,
            state,
            store,
            hub: SubscriptionHub::new(),
            message_seq: 0,
            message_open: false,
        }
    }

    /// Feeds one fragment of the current logical message.
    pub fn on_chunk(&mut self, raw: &str) -> ChunkStatus {
        self.begin_message();
        match self.accumulator.push(raw) {
            AccumulatorStep::Buffering => ChunkStatus::Buffering,
            AccumulatorStep::Text(text) => ChunkStatus::Text(text),
            AccumulatorStep::Completed(message) => {
                self.deliver(message.clone());
                ChunkStatus::Emitted(message)
            }
            AccumulatorStep::Ignored => {
                collector_debug!("chunk after completed message ignored ({} bytes)", raw.len());
                ChunkStatus::Ignored
            }
        }
    }

    /// Ends the current logical message. Returns the message delivered to
    /// the lifecycle manager at this point, if any.
    pub fn on_message_end(&mut self, final_raw: &str) -> Option<ClassifiedMessage> {
        self.begin_message();
        let outcome = self.accumulator.finish(final_raw);
        self.message_open = false;
        match outcome {
            Ok(Some(message)) => {
                self.deliver(message.clone());
                Some(message)
            }
            Ok(None) => None,
            Err(failure) => {
                collector_error!("Dropping payload: {}; raw buffer: {:?}", failure, failure.raw);
                None
            }
        }
    }

    /// Discards the partially accumulated message without delivering it.
    pub fn reset_message(&mut self) {
        self.accumulator.reset();
        self.message_open = false;
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&[ClassifiedMessage]) + Send + 'static,
    {
        self.hub.subscribe(callback)
    }

    pub fn subscribe_completed<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Package) + Send + 'static,
    {
        self.hub.subscribe_completed(callback)
    }

    pub fn commands_mut(&mut self) -> &mut CommandRegistry {
        &mut self.commands
    }

    pub fn list_packages(&self) -> Vec<&Package> {
        self.store.list_all()
    }

    pub fn get_package(&self, id: PackageId) -> Option<&Package> {
        self.store.get(id)
    }

    pub fn get_package_by_name(&self, name: &str) -> Option<&Package> {
        self.store.get_by_name(name)
    }

    pub fn get_open_package(&self) -> Option<&Package> {
        let open = self.state.open_package()?;
        self.store.get(open.id)
    }

    pub fn is_collecting(&self) -> bool {
        self.state.is_collecting()
    }

    pub fn view(&self) -> CollectorView {
        self.state.view()
    }

    /// Deletes by id or name. Unknown packages are a no-op.
    pub fn delete_package(&mut self, selector: impl Into<PackageSelector>) {
        let removed = match selector.into() {
            PackageSelector::Id(id) => self.store.delete(id),
            PackageSelector::Name(name) => self.store.delete_by_name(&name),
        };
        if let Some(package) = removed {
            collector_info!("Deleted package {} ({})", package.id, package.name);
            self.dispatch(Msg::PackageDeleted { id: package.id });
        }
    }

    pub fn clear_all(&mut self) {
        self.store.clear_all();
        self.dispatch(Msg::ClearAll);
        collector_info!("Cleared all packages");
    }

    fn begin_message(&mut self) {
        if !self.message_open {
            self.message_open = true;
            self.message_seq += 1;
            set_message_seq(self.message_seq);
        }
    }

    fn deliver(&mut self, message: ClassifiedMessage) {
        if let ClassifiedMessage::CommandCandidate(raw) = &message {
            if let Err(err) = self.commands.execute(raw) {
                collector_warn!("Command not executed: {}", err);
            }
        }
        let received_at = (self.config.clock)();
        self.dispatch(Msg::Ingest {
            message,
            received_at,
        });
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::OpenPackage {
                id,
                name,
                created_at,
            } => {
                if let Some(previous) = self.store.get_by_name(&name) {
                    collector_info!("Replacing package {} named {:?}", previous.id, name);
                }
                let package = self.store.create_or_replace(id, &name, created_at);
                collector_info!("Collecting package {} ({})", package.id, package.name);
            }
            Effect::ItemsAppended { id, items } => {
                if !self.store.replace_items(id, items.clone()) {
                    collector_warn!("Open package {} missing from store", id);
                }
                self.hub.notify_items(&items);
            }
            Effect::FinalizePackage { id, items } => match self.store.finalize(id, items) {
                Some(package) => {
                    collector_info!(
                        "Finalized package {} ({}) with {} items",
                        package.id,
                        package.name,
                        package.items.len()
                    );
                    self.hub.notify_completed(&package);
                }
                None => collector_warn!("Finalized package {} missing from store", id),
            },
            Effect::Discarded { message } => {
                collector_debug!("Idle, dropping message {:?}", message);
            }
        }
    }
}
