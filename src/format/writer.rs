//! Writes snapshot files from store entries.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;

use crate::types::error::{StoreError, StoreResult};
use crate::types::{Entry, EntryRef, SnapshotHeader, StoreConfig, ALL_TAG};

use super::compression::compress_payload;

/// Writer for snapshot files.
pub struct SnapshotWriter {
    reorder_period: usize,
    default_tag: String,
}

impl SnapshotWriter {
    /// Create a writer recording `config` alongside the entries.
    pub fn new(config: &StoreConfig) -> Self {
        Self {
            reorder_period: config.reorder_period,
            default_tag: config.default_tag.clone(),
        }
    }

    /// Save atomically: write `<path>.part`, sync it, rename it over `path`.
    ///
    /// Unless `force` is set an existing `path` is refused and left untouched.
    /// A failure never damages the previous snapshot.
    pub fn save<P: Serialize>(
        &self,
        entries: &[EntryRef<P>],
        path: &Path,
        force: bool,
    ) -> StoreResult<()> {
        if !force && path.exists() {
            return Err(StoreError::AlreadyExists(path.to_path_buf()));
        }
        let part = part_path(path);
        if let Err(e) = self.write_to_file(entries, &part) {
            let _ = std::fs::remove_file(&part);
            return Err(e);
        }
        std::fs::rename(&part, path)?;
        info!("Saved {} entries to {}", entries.len(), path.display());
        Ok(())
    }

    /// Write a snapshot to `path` directly (not atomic), syncing it to disk.
    pub fn write_to_file<P: Serialize>(&self, entries: &[EntryRef<P>], path: &Path) -> StoreResult<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        self.write_to(entries, &mut writer)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Write a snapshot to any writer.
    pub fn write_to<P: Serialize>(
        &self,
        entries: &[EntryRef<P>],
        writer: &mut impl Write,
    ) -> StoreResult<()> {
        let mut body: Vec<u8> = Vec::new();
        write_tag(&mut body, &self.default_tag)?;
        let mut tags: BTreeSet<&str> = BTreeSet::new();
        for entry in entries {
            write_entry_record(&mut body, entry)?;
            tags.extend(entry.tags.iter().map(String::as_str));
        }
        tags.remove(ALL_TAG);

        let mut header = SnapshotHeader::new(
            entries.len() as u64,
            tags.len() as u64,
            self.reorder_period as u64,
        );
        header.checksum = crc32fast::hash(&body);
        header.body_len = body.len() as u64;

        header.write_to(writer)?;
        writer.write_all(&body)?;
        Ok(())
    }
}

/// Temporary file a save writes before renaming: `<path>.part`.
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

/// Append a u16 length + UTF-8 bytes.
fn write_tag(buf: &mut Vec<u8>, tag: &str) -> StoreResult<()> {
    let len = u16::try_from(tag.len())
        .map_err(|_| StoreError::Payload(format!("tag too long: {} bytes", tag.len())))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(tag.as_bytes());
    Ok(())
}

/// Append one entry record.
///
/// Layout (little-endian): t, x, y, z (4 x f64), tag count (u16), each tag as
/// u16 length + UTF-8 bytes, payload length (u32) + compressed payload.
fn write_entry_record<P: Serialize>(buf: &mut Vec<u8>, entry: &Entry<P>) -> StoreResult<()> {
    for v in entry.position.to_array() {
        buf.extend_from_slice(&v.to_le_bytes());
    }

    let tag_count = u16::try_from(entry.tags.len())
        .map_err(|_| StoreError::Payload(format!("too many tags: {}", entry.tags.len())))?;
    buf.extend_from_slice(&tag_count.to_le_bytes());
    for tag in &entry.tags {
        write_tag(buf, tag)?;
    }

    let payload = compress_payload(&entry.payload)?;
    let len = u32::try_from(payload.len())
        .map_err(|_| StoreError::Payload(format!("payload too large: {} bytes", payload.len())))?;
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(())
}
