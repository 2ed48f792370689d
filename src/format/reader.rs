//! Reads snapshot files back into entries.

use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::types::error::{StoreError, StoreResult};
use crate::types::header::{SnapshotHeader, HEADER_SIZE};
use crate::types::{Entry, Position};

use super::compression::decompress_payload;

/// Decoded snapshot contents.
pub struct Snapshot<P> {
    pub header: SnapshotHeader,
    /// Default tag of the saved store.
    pub default_tag: String,
    /// Entries in their original insertion order.
    pub entries: Vec<Entry<P>>,
}

/// Reader for snapshot files.
pub struct SnapshotReader;

impl SnapshotReader {
    /// Read a snapshot file.
    pub fn read_from_file<P: DeserializeOwned>(path: &Path) -> StoreResult<Snapshot<P>> {
        let data = read_file(path)?;
        Self::read_bytes(&data)
    }

    /// Read only the header (and verify the checksum) of a snapshot file.
    pub fn read_header(path: &Path) -> StoreResult<SnapshotHeader> {
        let data = read_file(path)?;
        let (header, _) = split_checked(&data)?;
        Ok(header)
    }

    /// Read from any reader.
    pub fn read_from<P: DeserializeOwned>(reader: &mut impl Read) -> StoreResult<Snapshot<P>> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::read_bytes(&data)
    }

    fn read_bytes<P: DeserializeOwned>(data: &[u8]) -> StoreResult<Snapshot<P>> {
        let (header, body) = split_checked(data)?;

        let mut cursor = Cursor::new(body);
        let default_tag = read_tag(&mut cursor)?;
        let mut entries = Vec::with_capacity(header.entry_count.min(1 << 20) as usize);
        for _ in 0..header.entry_count {
            entries.push(read_entry_record(&mut cursor)?);
        }
        if cursor.remaining() != 0 {
            return Err(StoreError::Corrupt(cursor.offset()));
        }

        Ok(Snapshot {
            header,
            default_tag,
            entries,
        })
    }
}

fn read_file(path: &Path) -> StoreResult<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StoreError::SnapshotNotFound(path.to_path_buf())
        } else {
            StoreError::Io(e)
        }
    })
}

/// Parse the header, check the body length and checksum.
fn split_checked(data: &[u8]) -> StoreResult<(SnapshotHeader, &[u8])> {
    if data.len() < HEADER_SIZE {
        return Err(StoreError::Truncated);
    }
    let header = SnapshotHeader::read_from(&mut &data[..HEADER_SIZE])?;
    let body = &data[HEADER_SIZE..];
    let body_len = header.body_len as usize;
    if body.len() < body_len {
        return Err(StoreError::Truncated);
    }
    if body.len() > body_len {
        return Err(StoreError::Corrupt((HEADER_SIZE + body_len) as u64));
    }
    let actual = crc32fast::hash(body);
    if actual != header.checksum {
        return Err(StoreError::ChecksumMismatch {
            expected: header.checksum,
            actual,
        });
    }
    Ok((header, body))
}

/// Parse one entry record (see the writer for the layout).
fn read_entry_record<P: DeserializeOwned>(cursor: &mut Cursor<'_>) -> StoreResult<Entry<P>> {
    let mut coords = [0f64; 4];
    for c in &mut coords {
        *c = f64::from_le_bytes(cursor.array()?);
    }

    let tag_count = u16::from_le_bytes(cursor.array()?);
    let mut tags = BTreeSet::new();
    for _ in 0..tag_count {
        tags.insert(read_tag(cursor)?);
    }

    let len = u32::from_le_bytes(cursor.array()?) as usize;
    let payload = decompress_payload(cursor.take(len)?)?;

    Ok(Entry {
        payload,
        position: Position::from(coords),
        tags,
    })
}

/// Parse a u16 length + UTF-8 string.
fn read_tag(cursor: &mut Cursor<'_>) -> StoreResult<String> {
    let len = u16::from_le_bytes(cursor.array()?) as usize;
    let at = cursor.offset();
    let bytes = cursor.take(len)?;
    let tag = std::str::from_utf8(bytes).map_err(|_| StoreError::Corrupt(at))?;
    Ok(tag.to_string())
}

/// Bounds-checked reads over the snapshot body.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> StoreResult<&'a [u8]> {
        let end = self.pos.checked_add(n).ok_or(StoreError::Truncated)?;
        let bytes = self.data.get(self.pos..end).ok_or(StoreError::Truncated)?;
        self.pos = end;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> StoreResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Offset from the start of the file.
    fn offset(&self) -> u64 {
        (HEADER_SIZE + self.pos) as u64
    }
}
