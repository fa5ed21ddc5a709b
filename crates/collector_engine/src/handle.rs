use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use collector_core::Package;
use collector_logging::collector_error;

use crate::{EngineEvent, PackageSelector, StreamEngine};

enum EngineCommand {
    Chunk(String),
    MessageEnd(String),
    ListPackages(mpsc::Sender<Vec<Package>>),
    OpenPackage(mpsc::Sender<Option<Package>>),
    Delete(PackageSelector),
    ClearAll,
}

/// Runs a [`StreamEngine`] on its own thread behind a single-consumer
/// queue, so concurrent producers still reach it strictly in order.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
    worker: JoinHandle<()>,
}

impl EngineHandle {
    pub fn spawn(engine: StreamEngine) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();

        let items_tx = event_tx.clone();
        // Subscriptions live as long as the engine itself.
        let _ = engine.subscribe(move |items| {
            let _ = items_tx.send(EngineEvent::ItemsUpdated(items.to_vec()));
        });
        let _ = engine.subscribe_completed(move |package| {
            let _ = event_tx.send(EngineEvent::PackageCompleted(package.clone()));
        });

        let worker = thread::spawn(move || {
            let mut engine = engine;
            while let Ok(command) = cmd_rx.recv() {
                handle_command(&mut engine, command);
            }
        });

        Self {
            cmd_tx,
            event_rx,
            worker,
        }
    }

    pub fn send_chunk(&self, raw: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Chunk(raw.into()));
    }

    pub fn end_message(&self, final_raw: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::MessageEnd(final_raw.into()));
    }

    /// Blocks until every previously queued command has been processed.
    pub fn list_packages(&self) -> Vec<Package> {
        let (reply_tx, reply_rx) = mpsc::channel();
        if self.cmd_tx.send(EngineCommand::ListPackages(reply_tx)).is_err() {
            return Vec::new();
        }
        reply_rx.recv().unwrap_or_default()
    }

    pub fn open_package(&self) -> Option<Package> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.cmd_tx.send(EngineCommand::OpenPackage(reply_tx)).ok()?;
        reply_rx.recv().ok().flatten()
    }

    pub fn delete_package(&self, selector: impl Into<PackageSelector>) {
        let _ = self.cmd_tx.send(EngineCommand::Delete(selector.into()));
    }

    pub fn clear_all(&self) {
        let _ = self.cmd_tx.send(EngineCommand::ClearAll);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Stops the worker after the queue drains and returns undelivered events.
    pub fn shutdown(self) -> Vec<EngineEvent> {
        let EngineHandle {
            cmd_tx,
            event_rx,
            worker,
        } = self;
        drop(cmd_tx);
        if worker.join().is_err() {
            collector_error!("Engine worker panicked");
        }
        event_rx.try_iter().collect()
    }
}

fn handle_command(engine: &mut StreamEngine, command: EngineCommand) {
    match command {
        EngineCommand::Chunk(raw) => {
            engine.on_chunk(&raw);
        }
        EngineCommand::MessageEnd(final_raw) => {
            engine.on_message_end(&final_raw);
        }
        EngineCommand::ListPackages(reply) => {
            let packages = engine.list_packages().into_iter().cloned().collect();
            let _ = reply.send(packages);
        }
        EngineCommand::OpenPackage(reply) => {
            let _ = reply.send(engine.get_open_package().cloned());
        }
        EngineCommand::Delete(selector) => engine.delete_package(selector),
        EngineCommand::ClearAll => engine.clear_all(),
    }
}
