//! Core store: entry arena, per-tag indexes, and the search-priority ordering.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::format::{SnapshotReader, SnapshotWriter};
use crate::index::TagIndex;
use crate::query::{QueryOptions, RequiredTags, SortCriterion};
use crate::types::{
    Axis, Bounds, Entry, EntryRef, Region, StoreConfig, StoreError, StoreResult, ALL_TAG,
};

/// Append-only store of tagged space-time entries.
///
/// Not synchronized; share it across threads through [`crate::Database`].
pub struct SpatialStore<P> {
    /// Every entry, in insertion order. Indexes refer to positions in here.
    arena: Vec<EntryRef<P>>,
    /// Index holding every entry.
    all: TagIndex,
    /// One index per tag.
    tags: HashMap<String, TagIndex>,
    /// Tag names (including "ALL") from smallest to largest index.
    search_priority: Vec<String>,
    inserts_since_reorder: usize,
    config: StoreConfig,
}

impl<P> SpatialStore<P> {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            arena: Vec::new(),
            all: TagIndex::new(),
            tags: HashMap::new(),
            search_priority: vec![ALL_TAG.to_string()],
            inserts_since_reorder: 0,
            config,
        }
    }

    /// Build a store by inserting `entries` in order.
    pub fn from_entries(
        entries: impl IntoIterator<Item = Entry<P>>,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        let mut store = Self::with_config(config);
        for entry in entries {
            store.insert(entry)?;
        }
        store.reorder_priority();
        Ok(store)
    }

    /// Insert an entry and return the shared handle now held by the store.
    ///
    /// An entry without tags gets the configured default tag.
    pub fn insert(&mut self, entry: Entry<P>) -> StoreResult<EntryRef<P>> {
        self.insert_shared(Arc::new(entry))
    }

    /// Insert an entry already behind an `Arc` (e.g. replayed from another store).
    ///
    /// An untagged entry gets the configured default tag, which needs the
    /// `Arc` to be unique; a shared untagged entry is refused with
    /// `UntaggedEntry`. Nothing is modified when the entry is refused.
    pub fn insert_shared(&mut self, mut entry: EntryRef<P>) -> StoreResult<EntryRef<P>> {
        if !entry.position.is_finite() {
            return Err(StoreError::InvalidPosition(entry.position));
        }
        let id = u32::try_from(self.arena.len()).map_err(|_| StoreError::StoreFull)?;
        if entry.tags.is_empty() {
            let unique = Arc::get_mut(&mut entry).ok_or(StoreError::UntaggedEntry)?;
            unique.tags.insert(self.config.default_tag.clone());
        }

        self.all.insert(id, &entry.position);
        for tag in &entry.tags {
            if tag == ALL_TAG {
                continue;
            }
            match self.tags.get_mut(tag) {
                Some(index) => index.insert(id, &entry.position),
                None => {
                    debug!("Creating index for tag {tag:?}");
                    let mut index = TagIndex::new();
                    index.insert(id, &entry.position);
                    self.tags.insert(tag.clone(), index);
                    // A fresh index is as small as an index gets.
                    self.search_priority.insert(0, tag.clone());
                }
            }
        }
        self.arena.push(Arc::clone(&entry));

        self.inserts_since_reorder += 1;
        if self.inserts_since_reorder >= self.config.reorder_period {
            self.reorder_priority();
        }
        Ok(entry)
    }

    /// Sort the search priority by ascending index size (ties by tag name).
    pub fn reorder_priority(&mut self) {
        let (all, tags) = (&self.all, &self.tags);
        let mut sized: Vec<(usize, String)> = self
            .search_priority
            .drain(..)
            .map(|tag| (index_len(all, tags, &tag), tag))
            .collect();
        sized.sort();
        self.search_priority = sized.into_iter().map(|(_, tag)| tag).collect();
        self.inserts_since_reorder = 0;
        debug!("Search priority reordered: {:?}", self.search_priority);
    }

    /// Entries carrying all `tags` inside `region`, in unspecified order.
    ///
    /// Negative time bounds are offsets from [`latest_time`](Self::latest_time),
    /// whatever the tags.
    pub fn find_entries(&self, tags: &[&str], region: &Region) -> StoreResult<Vec<EntryRef<P>>> {
        self.find_entries_with(tags, region, &QueryOptions::default())
    }

    /// Like [`find_entries`](Self::find_entries), ordered by `sort`.
    pub fn find_entries_sorted(
        &self,
        tags: &[&str],
        region: &Region,
        sort: &dyn SortCriterion<P>,
    ) -> StoreResult<Vec<EntryRef<P>>> {
        let options = QueryOptions {
            sort: Some(sort),
            ..QueryOptions::default()
        };
        self.find_entries_with(tags, region, &options)
    }

    /// Entry lookup with explicit options.
    pub fn find_entries_with(
        &self,
        tags: &[&str],
        region: &Region,
        options: &QueryOptions<'_, P>,
    ) -> StoreResult<Vec<EntryRef<P>>> {
        let (required, region) = self.prepare(tags, region, options.assume_positive_time)?;
        let Some(index) = self.search_index(&required) else {
            return Ok(Vec::new());
        };
        let mut result: Vec<EntryRef<P>> = index
            .range_query(&self.arena, &region, &required)
            .into_iter()
            .map(|id| Arc::clone(&self.arena[id as usize]))
            .collect();
        if let Some(sort) = options.sort {
            result.sort_by(|a, b| sort.compare(a, b));
        }
        Ok(result)
    }

    /// Per-axis (t, x, y, z) bounds of the entries `find_entries` would return.
    pub fn find_bounds(&self, tags: &[&str], region: &Region) -> StoreResult<[Bounds; 4]> {
        self.find_bounds_with(tags, region, true)
    }

    /// Bounds lookup with explicit time-key handling.
    pub fn find_bounds_with(
        &self,
        tags: &[&str],
        region: &Region,
        assume_positive_time: bool,
    ) -> StoreResult<[Bounds; 4]> {
        let (required, region) = self.prepare(tags, region, assume_positive_time)?;
        Ok(match self.search_index(&required) {
            Some(index) => index.bounds_query(&self.arena, &region, &required),
            None => [Bounds::new(); 4],
        })
    }

    /// Most recent (greatest time) entry carrying `tag`. Direct read, no search.
    pub fn last_entry(&self, tag: &str) -> StoreResult<EntryRef<P>> {
        let index = self
            .index(tag)
            .ok_or_else(|| StoreError::TagNotFound(tag.to_string()))?;
        let id = index
            .last_id()
            .ok_or_else(|| StoreError::NoEntries(tag.to_string()))?;
        Ok(Arc::clone(&self.arena[id as usize]))
    }

    /// Entries carrying all `tags`, ascending by time.
    pub fn entries_by_time(&self, tags: &[&str]) -> Vec<EntryRef<P>> {
        let required = required_tags(tags);
        let Some(index) = self.search_index(&required) else {
            return Vec::new();
        };
        index
            .axis(Axis::T)
            .entries()
            .iter()
            .map(|&(_, id)| &self.arena[id as usize])
            .filter(|e| e.has_all_tags(required.tags()))
            .cloned()
            .collect()
    }

    /// Validate the region, drop "ALL" from the tags, resolve relative time.
    fn prepare(
        &self,
        tags: &[&str],
        region: &Region,
        assume_positive_time: bool,
    ) -> StoreResult<(RequiredTags, Region)> {
        region.validate()?;
        let region = if assume_positive_time {
            region.resolve_time(self.latest_time())
        } else {
            *region
        };
        Ok((required_tags(tags), region))
    }

    /// Smallest index worth scanning for `required`.
    ///
    /// `None` when a required tag has no index: nothing can match.
    fn search_index(&self, required: &RequiredTags) -> Option<&TagIndex> {
        if required.is_empty() {
            return Some(&self.all);
        }
        if required.tags().iter().any(|t| !self.tags.contains_key(t)) {
            return None;
        }
        self.search_priority
            .iter()
            .find(|tag| required.contains(tag))
            .and_then(|tag| self.tags.get(tag))
            .or(Some(&self.all))
    }

    /// Index for a tag name ("ALL" included).
    pub fn index(&self, tag: &str) -> Option<&TagIndex> {
        if tag == ALL_TAG {
            Some(&self.all)
        } else {
            self.tags.get(tag)
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Greatest time coordinate stored.
    pub fn latest_time(&self) -> Option<f64> {
        self.all.latest_time()
    }

    /// Known tags (without "ALL"), sorted by name.
    pub fn tags(&self) -> Vec<String> {
        let mut tags: Vec<String> = self.tags.keys().cloned().collect();
        tags.sort_unstable();
        tags
    }

    /// Number of entries carrying `tag` (0 for unknown tags).
    pub fn tag_len(&self, tag: &str) -> usize {
        index_len(&self.all, &self.tags, tag)
    }

    /// Current search priority, smallest index first.
    pub fn search_priority(&self) -> &[String] {
        &self.search_priority
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[EntryRef<P>] {
        &self.arena
    }

    /// The store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}

impl<P: Serialize> SpatialStore<P> {
    /// Snapshot the store to `path` (atomic; refuses to overwrite unless `force`).
    pub fn save(&self, path: &Path, force: bool) -> StoreResult<()> {
        SnapshotWriter::new(&self.config).save(&self.arena, path, force)
    }
}

impl<P: DeserializeOwned> SpatialStore<P> {
    /// Rebuild a store from a snapshot file.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let snapshot = SnapshotReader::read_from_file(path)?;
        let config = StoreConfig::default()
            .reorder_period(snapshot.header.reorder_period as usize)
            .default_tag(snapshot.default_tag);
        let store = Self::from_entries(snapshot.entries, config)?;
        info!(
            "Loaded {} entries ({} tags) from {}",
            store.len(),
            store.tags.len(),
            path.display()
        );
        Ok(store)
    }
}

impl<P> Default for SpatialStore<P> {
    fn default() -> Self {
        Self::new()
    }
}

fn index_len(all: &TagIndex, tags: &HashMap<String, TagIndex>, tag: &str) -> usize {
    if tag == ALL_TAG {
        all.len()
    } else {
        tags.get(tag).map_or(0, TagIndex::len)
    }
}

fn required_tags(tags: &[&str]) -> RequiredTags {
    RequiredTags::new(tags.iter().copied().filter(|t| *t != ALL_TAG))
}
