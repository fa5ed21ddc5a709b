use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use collector_core::{ClassifiedMessage, Package};

type ItemsCallback = dyn FnMut(&[ClassifiedMessage]) + Send;
type CompletedCallback = dyn FnMut(&Package) + Send;

/// Handle returned by the hub. Dropping it keeps the callback registered;
/// call [`Subscription::unsubscribe`] to remove it.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

struct Listeners<F: ?Sized> {
    next_id: u64,
    entries: Vec<(u64, Arc<Mutex<Box<F>>>)>,
}

impl<F: ?Sized> Default for Listeners<F> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }
}

impl<F: ?Sized> Listeners<F> {
    fn add(&mut self, callback: Box<F>) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push((id, Arc::new(Mutex::new(callback))));
        id
    }

    fn remove(&mut self, id: u64) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    fn snapshot(&self) -> Vec<Arc<Mutex<Box<F>>>> {
        self.entries.iter().map(|(_, cb)| cb.clone()).collect()
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn attach<F>(listeners: &Arc<Mutex<Listeners<F>>>, callback: Box<F>) -> Subscription
where
    F: ?Sized + Send + 'static,
{
    let id = lock(listeners).add(callback);
    let weak: Weak<Mutex<Listeners<F>>> = Arc::downgrade(listeners);
    Subscription {
        cancel: Some(Box::new(move || {
            if let Some(listeners) = weak.upgrade() {
                lock(&listeners).remove(id);
            }
        })),
    }
}

/// In-process, synchronous fan-out of package updates.
///
/// Callbacks run in registration order on the calling thread. The listener
/// list is snapshotted before delivery, so a callback may unsubscribe.
#[derive(Clone, Default)]
pub struct SubscriptionHub {
    items: Arc<Mutex<Listeners<ItemsCallback>>>,
    completed: Arc<Mutex<Listeners<CompletedCallback>>>,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers for the full scratch list after every append.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&[ClassifiedMessage]) + Send + 'static,
    {
        attach(&self.items, Box::new(callback))
    }

    /// Registers for packages as they are finalized.
    pub fn subscribe_completed<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&Package) + Send + 'static,
    {
        attach(&self.completed, Box::new(callback))
    }

    pub fn notify_items(&self, items: &[ClassifiedMessage]) {
        let callbacks = lock(&self.items).snapshot();
        for callback in callbacks {
            let mut callback = lock(&callback);
            (&mut **callback)(items);
        }
    }

    pub fn notify_completed(&self, package: &Package) {
        let callbacks = lock(&self.completed).snapshot();
        for callback in callbacks {
            let mut callback = lock(&callback);
            (&mut **callback)(package);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock(&self.items).entries.len() + lock(&self.completed).entries.len()
    }
}

impl std::fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("items", &lock(&self.items).entries.len())
            .field("completed", &lock(&self.completed).entries.len())
            .finish()
    }
}
