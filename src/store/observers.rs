//! Insert subscriptions.
//!
//! Subscribers register a tag filter and a callback; every entry inserted
//! through a [`Database`](super::Database) that carries all the filter's tags
//! is handed to the callback once the write lock has been released.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::query::{RequiredTags, TagPredicate};
use crate::types::{EntryRef, ALL_TAG};

/// Callback run for every matching inserted entry.
pub type InsertCallback<P> = Box<dyn Fn(&EntryRef<P>) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscriber<P> {
    id: SubscriptionId,
    filter: RequiredTags,
    callback: Arc<InsertCallback<P>>,
}

/// Registry of insert subscribers.
pub(crate) struct Observers<P> {
    subscribers: RwLock<Vec<Subscriber<P>>>,
    next_id: AtomicU64,
}

impl<P> Observers<P> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register `callback` for entries carrying all `tags` ("ALL" is ignored).
    pub(crate) fn subscribe(&self, tags: &[&str], callback: InsertCallback<P>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let filter = RequiredTags::new(tags.iter().copied().filter(|t| *t != ALL_TAG));
        debug!("Subscriber {:?} attached for tags {:?}", id, filter.tags());
        self.subscribers.write().push(Subscriber {
            id,
            filter,
            callback: Arc::new(callback),
        });
        id
    }

    /// Remove a subscriber. Returns `false` when `id` is not registered.
    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        before != subscribers.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Hand every entry to the subscribers whose filter accepts it.
    ///
    /// Callbacks run without the registry lock held, so they may subscribe
    /// or unsubscribe.
    pub(crate) fn notify(&self, entries: &[EntryRef<P>]) {
        if entries.is_empty() {
            return;
        }
        let targets: Vec<(RequiredTags, Arc<InsertCallback<P>>)> = self
            .subscribers
            .read()
            .iter()
            .map(|s| (s.filter.clone(), Arc::clone(&s.callback)))
            .collect();
        for entry in entries {
            for (filter, callback) in &targets {
                if filter.accepts(&entry.tags) {
                    callback(entry);
                }
            }
        }
    }
}

/// Entries inserted under a write guard, delivered when it goes away.
pub(crate) struct PendingNotify<'a, P> {
    observers: &'a Observers<P>,
    entries: Vec<EntryRef<P>>,
}

impl<'a, P> PendingNotify<'a, P> {
    pub(crate) fn new(observers: &'a Observers<P>) -> Self {
        Self {
            observers,
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, entry: EntryRef<P>) {
        self.entries.push(entry);
    }
}

impl<P> Drop for PendingNotify<'_, P> {
    fn drop(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        self.observers.notify(&entries);
    }
}
