//! File header for snapshot files.

use std::io::{Read, Write};

use super::error::{StoreError, StoreResult};
use super::{now_micros, FORMAT_VERSION, STDB_MAGIC};

/// Header of a snapshot file. Fixed size: 64 bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapshotHeader {
    /// Magic bytes: [0x53, 0x54, 0x44, 0x42] ("STDB").
    pub magic: [u8; 4],
    /// Format version (currently 1).
    pub version: u32,
    /// CRC32 of everything following the header.
    pub checksum: u32,
    /// Number of entry records in the body.
    pub entry_count: u64,
    /// Number of distinct tags (excluding "ALL").
    pub tag_count: u64,
    /// When the snapshot was written (Unix epoch microseconds).
    pub saved_at: u64,
    /// Length of the body in bytes.
    pub body_len: u64,
    /// Reorder period of the saved store.
    pub reorder_period: u64,
}

/// The fixed size of a SnapshotHeader on disk: 64 bytes.
pub const HEADER_SIZE: usize = 64;

impl SnapshotHeader {
    /// Create a header stamped with the current time.
    pub fn new(entry_count: u64, tag_count: u64, reorder_period: u64) -> Self {
        Self {
            magic: STDB_MAGIC,
            version: FORMAT_VERSION,
            checksum: 0,
            entry_count,
            tag_count,
            saved_at: now_micros(),
            body_len: 0,
            reorder_period,
        }
    }

    /// Write this header. Writes exactly 64 bytes.
    ///
    /// Layout (all little-endian):
    /// - 0x00..0x04: magic
    /// - 0x04..0x08: version (u32)
    /// - 0x08..0x0C: _reserved (u32, written as 0)
    /// - 0x0C..0x10: checksum (u32)
    /// - 0x10..0x18: entry_count (u64)
    /// - 0x18..0x20: tag_count (u64)
    /// - 0x20..0x28: saved_at (u64)
    /// - 0x28..0x30: body_len (u64)
    /// - 0x30..0x38: reorder_period (u64)
    /// - 0x38..0x40: _reserved (u64, written as 0)
    pub fn write_to(&self, writer: &mut impl Write) -> StoreResult<()> {
        writer.write_all(&self.magic)?;
        writer.write_all(&self.version.to_le_bytes())?;
        writer.write_all(&0u32.to_le_bytes())?;
        writer.write_all(&self.checksum.to_le_bytes())?;
        writer.write_all(&self.entry_count.to_le_bytes())?;
        writer.write_all(&self.tag_count.to_le_bytes())?;
        writer.write_all(&self.saved_at.to_le_bytes())?;
        writer.write_all(&self.body_len.to_le_bytes())?;
        writer.write_all(&self.reorder_period.to_le_bytes())?;
        writer.write_all(&0u64.to_le_bytes())?;
        Ok(())
    }

    /// Read a header. Reads exactly 64 bytes.
    pub fn read_from(reader: &mut impl Read) -> StoreResult<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                StoreError::Truncated
            } else {
                StoreError::Io(e)
            }
        })?;

        let magic = [buf[0], buf[1], buf[2], buf[3]];
        if magic != STDB_MAGIC {
            return Err(StoreError::InvalidMagic);
        }

        let version = le_u32(&buf[4..8]);
        if version != FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion(version));
        }

        Ok(Self {
            magic,
            version,
            checksum: le_u32(&buf[12..16]),
            entry_count: le_u64(&buf[16..24]),
            tag_count: le_u64(&buf[24..32]),
            saved_at: le_u64(&buf[32..40]),
            body_len: le_u64(&buf[40..48]),
            reorder_period: le_u64(&buf[48..56]),
        })
    }
}

fn le_u32(b: &[u8]) -> u32 {
    u32::from_le_bytes([b[0], b[1], b[2], b[3]])
}

fn le_u64(b: &[u8]) -> u64 {
    let mut a = [0u8; 8];
    a.copy_from_slice(&b[..8]);
    u64::from_le_bytes(a)
}
