//! All data types for the spacetime index.

pub mod bounds;
pub mod config;
pub mod entry;
pub mod error;
pub mod header;
pub mod position;
pub mod region;

pub use bounds::Bounds;
pub use config::StoreConfig;
pub use entry::{Entry, EntryRef};
pub use error::{StoreError, StoreResult};
pub use header::{SnapshotHeader, HEADER_SIZE};
pub use position::{Axis, Position};
pub use region::{AxisSpec, Region};

/// Magic bytes at the start of every snapshot file.
pub const STDB_MAGIC: [u8; 4] = [0x53, 0x54, 0x44, 0x42]; // "STDB"

/// Current snapshot format version.
pub const FORMAT_VERSION: u32 = 1;

/// Name of the index holding every entry.
pub const ALL_TAG: &str = "ALL";

/// Tag given to entries inserted without any tag.
pub const DEFAULT_TAG: &str = "misc";

/// Number of inserts between two search-priority reorder passes.
pub const DEFAULT_REORDER_PERIOD: usize = 1000;

/// Default interval between two periodic snapshots: 60 seconds.
pub const DEFAULT_SAVE_TICK: std::time::Duration = std::time::Duration::from_secs(60);

/// Returns the current time as Unix epoch microseconds.
pub fn now_micros() -> u64 {
    chrono::Utc::now().timestamp_micros() as u64
}
