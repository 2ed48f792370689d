//! The store core and the thread-safe handle around it.

pub mod database;
pub mod observers;
pub mod periodic;
pub mod spatial_store;

pub use database::{Database, WriteGuard};
pub use observers::{InsertCallback, SubscriptionId};
pub use periodic::PeriodicSave;
pub use spatial_store::SpatialStore;
