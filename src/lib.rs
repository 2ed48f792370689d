//! Spacetime index: a tagged 4-D (t, x, y, z) store for sensor observations.
//!
//! Entries are inserted one at a time and retrieved with hyper-rectangle
//! range queries restricted to a set of tags. Every tag gets its own index
//! holding the tag's entries sorted four ways, one per axis, so a 4-D range
//! query is answered with four binary searches and an intersection.
//! Stores are snapshotted atomically to disk, on demand or periodically.

pub mod cli;
pub mod format;
pub mod index;
pub mod query;
pub mod replay;
pub mod store;
pub mod types;

// Re-export commonly used types at the crate root
pub use format::{Snapshot, SnapshotReader, SnapshotWriter};
pub use index::{AxisIndex, TagIndex};
pub use query::{
    AnyTags, ByAxis, Query, QueryOptions, RequiredTags, SortCriterion, TagPredicate, BY_TIME,
};
pub use replay::ReplayCursor;
pub use store::{
    Database, InsertCallback, PeriodicSave, SpatialStore, SubscriptionId, WriteGuard,
};
pub use types::{
    now_micros, Axis, AxisSpec, Bounds, Entry, EntryRef, Position, Region, SnapshotHeader,
    StoreConfig, StoreError, StoreResult, ALL_TAG, DEFAULT_REORDER_PERIOD, DEFAULT_SAVE_TICK,
    DEFAULT_TAG,
};
