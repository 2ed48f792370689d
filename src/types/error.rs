//! Error types for the spacetime index.

use std::path::PathBuf;

use thiserror::Error;

use super::Position;

/// All errors that can occur in the spacetime index.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Refused to overwrite an existing snapshot without `force`.
    #[error("Path \"{0}\" already exists (pass force to overwrite it)")]
    AlreadyExists(PathBuf),

    /// Snapshot file does not exist.
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(PathBuf),

    /// No index exists for this tag.
    #[error("Unknown tag: {0}")]
    TagNotFound(String),

    /// The index exists but holds no entry.
    #[error("No entries under tag {0}")]
    NoEntries(String),

    /// Malformed region or axis bounds.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Entry position has a NaN or infinite coordinate.
    #[error("Position must be finite: {0}")]
    InvalidPosition(Position),

    /// A shared (`Arc`) entry without tags cannot be given the default tag.
    #[error("Entry has no tags and is shared, so the default tag cannot be added")]
    UntaggedEntry,

    /// Arena ids are exhausted.
    #[error("Store is full ({} entries)", u32::MAX)]
    StoreFull,

    /// A periodic save is already scheduled on this store.
    #[error("Periodic save already enabled")]
    PeriodicSaveActive,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid magic bytes in snapshot header.
    #[error("Invalid magic bytes in snapshot header")]
    InvalidMagic,

    /// Unsupported snapshot format version.
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),

    /// Snapshot body does not match the checksum stored in its header.
    #[error("Checksum mismatch: expected {expected:#010x}, got {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    /// File is empty or truncated.
    #[error("File is empty or truncated")]
    Truncated,

    /// Corrupt data at a given offset.
    #[error("Corrupt data at offset {0}")]
    Corrupt(u64),

    /// Payload could not be encoded or decoded.
    #[error("Payload error: {0}")]
    Payload(String),

    /// Compression error.
    #[error("Compression error: {0}")]
    Compression(String),
}

/// Convenience result type for spacetime index operations.
pub type StoreResult<T> = Result<T, StoreError>;
