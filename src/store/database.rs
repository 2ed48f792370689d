//! Thread-safe store handle.
//!
//! One `RwLock` guards the store: inserts go through a [`WriteGuard`], queries
//! take the read side, so a query never observes a half-applied insert.
//! Insert subscribers are called after the write lock is released.

use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::observers::{InsertCallback, Observers, PendingNotify, SubscriptionId};
use super::periodic::{PeriodicSave, SaveJob};
use super::SpatialStore;
use crate::format::SnapshotWriter;
use crate::query::{Query, SortCriterion};
use crate::types::{Bounds, Entry, EntryRef, Region, StoreConfig, StoreError, StoreResult};

struct Shared<P> {
    store: Arc<RwLock<SpatialStore<P>>>,
    /// Serializes snapshot writers so they never share a `.part` file.
    save_lock: Arc<Mutex<()>>,
    periodic: Mutex<Option<PeriodicSave>>,
    observers: Observers<P>,
}

/// Cloneable, thread-safe handle on a [`SpatialStore`].
pub struct Database<P> {
    shared: Arc<Shared<P>>,
}

impl<P> Clone for Database<P> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<P> std::fmt::Debug for Database<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

/// Exclusive write access. Every insert made through one guard is seen
/// by readers all at once, when the guard is dropped.
///
/// Subscribers hear about the inserted entries after the lock is released.
pub struct WriteGuard<'a, P> {
    // Dropped in declaration order: unlock first, then notify.
    store: RwLockWriteGuard<'a, SpatialStore<P>>,
    pending: PendingNotify<'a, P>,
}

impl<P> WriteGuard<'_, P> {
    /// Insert an entry.
    pub fn insert(&mut self, entry: Entry<P>) -> StoreResult<EntryRef<P>> {
        let entry = self.store.insert(entry)?;
        self.pending.push(Arc::clone(&entry));
        Ok(entry)
    }

    /// Insert an entry already behind an `Arc`.
    pub fn insert_shared(&mut self, entry: EntryRef<P>) -> StoreResult<EntryRef<P>> {
        let entry = self.store.insert_shared(entry)?;
        self.pending.push(Arc::clone(&entry));
        Ok(entry)
    }

    /// Force a search-priority reorder pass.
    pub fn reorder_priority(&mut self) {
        self.store.reorder_priority();
    }
}

impl<P> Deref for WriteGuard<'_, P> {
    type Target = SpatialStore<P>;

    fn deref(&self) -> &SpatialStore<P> {
        &self.store
    }
}

impl<P: Send + Sync + 'static> Database<P> {
    /// Create an empty database with the default configuration.
    pub fn new() -> Self {
        Self::from_store(SpatialStore::new())
    }

    /// Create an empty database.
    pub fn with_config(config: StoreConfig) -> Self {
        Self::from_store(SpatialStore::with_config(config))
    }

    /// Wrap an existing store.
    pub fn from_store(store: SpatialStore<P>) -> Self {
        Self {
            shared: Arc::new(Shared {
                store: Arc::new(RwLock::new(store)),
                save_lock: Arc::new(Mutex::new(())),
                periodic: Mutex::new(None),
                observers: Observers::new(),
            }),
        }
    }

    /// Take the write lock.
    pub fn write(&self) -> WriteGuard<'_, P> {
        WriteGuard {
            store: self.shared.store.write(),
            pending: PendingNotify::new(&self.shared.observers),
        }
    }

    /// Take the read lock. Holding it blocks writers.
    pub fn read(&self) -> RwLockReadGuard<'_, SpatialStore<P>> {
        self.shared.store.read()
    }

    /// Insert one entry.
    pub fn insert(&self, entry: Entry<P>) -> StoreResult<EntryRef<P>> {
        self.write().insert(entry)
    }

    /// Insert one entry already behind an `Arc`.
    pub fn insert_shared(&self, entry: EntryRef<P>) -> StoreResult<EntryRef<P>> {
        self.write().insert_shared(entry)
    }

    /// Call `callback` for every entry inserted from now on that carries all
    /// `tags` (every entry when `tags` is empty).
    ///
    /// Callbacks run on the inserting thread once its write lock is released,
    /// in subscription order. They may query the database or insert into it.
    pub fn subscribe(&self, tags: &[&str], callback: InsertCallback<P>) -> SubscriptionId {
        self.shared.observers.subscribe(tags, callback)
    }

    /// Stop notifying a subscriber. Returns `false` for an unknown id.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.observers.unsubscribe(id)
    }

    /// Number of insert subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.observers.len()
    }

    /// See [`SpatialStore::find_entries`].
    pub fn find_entries(&self, tags: &[&str], region: &Region) -> StoreResult<Vec<EntryRef<P>>> {
        self.read().find_entries(tags, region)
    }

    /// See [`SpatialStore::find_entries_sorted`].
    pub fn find_entries_sorted(
        &self,
        tags: &[&str],
        region: &Region,
        sort: &dyn SortCriterion<P>,
    ) -> StoreResult<Vec<EntryRef<P>>> {
        self.read().find_entries_sorted(tags, region, sort)
    }

    /// See [`SpatialStore::find_bounds`].
    pub fn find_bounds(&self, tags: &[&str], region: &Region) -> StoreResult<[Bounds; 4]> {
        self.read().find_bounds(tags, region)
    }

    /// See [`SpatialStore::last_entry`].
    pub fn last_entry(&self, tag: &str) -> StoreResult<EntryRef<P>> {
        self.read().last_entry(tag)
    }

    /// Start building a query over entries carrying all `tags`.
    pub fn query(&self, tags: &[&str]) -> Query<'_, P> {
        Query::new(self, tags)
    }

    /// Entries carrying all `tags`, ascending by time.
    pub fn entries_by_time(&self, tags: &[&str]) -> Vec<EntryRef<P>> {
        self.read().entries_by_time(tags)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether the database is empty.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Known tags (without "ALL").
    pub fn tags(&self) -> Vec<String> {
        self.read().tags()
    }

    /// Current search priority, smallest index first.
    pub fn search_priority(&self) -> Vec<String> {
        self.read().search_priority().to_vec()
    }

    /// Whether a periodic save is running.
    pub fn is_periodic_save_enabled(&self) -> bool {
        self.shared.periodic.lock().is_some()
    }

    /// Stop the periodic save, after one final synchronous save.
    /// Does nothing when no periodic save is running.
    pub fn disable_periodic_save(&self) -> StoreResult<()> {
        let task = self.shared.periodic.lock().take();
        match task {
            Some(task) => task.stop(),
            None => Ok(()),
        }
    }
}

impl<P: Serialize + Send + Sync + 'static> Database<P> {
    /// Snapshot to `path` (atomic; refuses to overwrite unless `force`).
    ///
    /// Inserts are blocked only while the entry handles are copied, not
    /// while the file is written.
    pub fn save(&self, path: &Path, force: bool) -> StoreResult<()> {
        save_store(&self.shared.store, &self.shared.save_lock, path, force)
    }

    /// Save to `path` every `tick` from now on, overwriting previous saves.
    ///
    /// Fails with `AlreadyExists` when `path` exists and `force` is not set.
    pub fn enable_periodic_save(&self, path: &Path, tick: Duration, force: bool) -> StoreResult<()> {
        let mut periodic = self.shared.periodic.lock();
        if periodic.is_some() {
            return Err(StoreError::PeriodicSaveActive);
        }
        if !force && path.exists() {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        let job: SaveJob = {
            let store = Arc::clone(&self.shared.store);
            let save_lock = Arc::clone(&self.shared.save_lock);
            let path = path.to_path_buf();
            Arc::new(move || save_store(&store, &save_lock, &path, true))
        };
        *periodic = Some(PeriodicSave::start(path, tick, job)?);
        Ok(())
    }
}

impl<P: DeserializeOwned + Send + Sync + 'static> Database<P> {
    /// Load a database from a snapshot file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        Ok(Self::from_store(SpatialStore::load(path)?))
    }
}

impl<P: Send + Sync + 'static> Default for Database<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn save_store<P: Serialize>(
    store: &RwLock<SpatialStore<P>>,
    save_lock: &Mutex<()>,
    path: &Path,
    force: bool,
) -> StoreResult<()> {
    let _saving = save_lock.lock();
    let (entries, writer) = {
        let store = store.read();
        (store.entries().to_vec(), SnapshotWriter::new(store.config()))
    };
    writer.save(&entries, path, force)
}
