//! Binary snapshot files.
//!
//! A snapshot is a 64-byte [`SnapshotHeader`](crate::types::SnapshotHeader)
//! followed by the store's default tag (u16 length + UTF-8) and one record
//! per entry, in insertion order. Indexes are not stored; loading re-inserts
//! the entries.

pub mod compression;
pub mod reader;
pub mod writer;

pub use reader::{Snapshot, SnapshotReader};
pub use writer::{part_path, SnapshotWriter};
