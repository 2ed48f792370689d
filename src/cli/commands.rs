//! CLI command implementations.
//!
//! Snapshots handled by the CLI carry JSON payloads.

use std::io::Write;
use std::path::Path;

use crate::format::SnapshotReader;
use crate::query::ByAxis;
use crate::store::Database;
use crate::types::{Axis, Bounds, Entry, EntryRef, Position, Region, StoreResult};

/// Payload type of snapshots created by the CLI.
pub type Payload = serde_json::Value;

/// Create a new empty snapshot file.
pub fn cmd_create(path: &Path, force: bool) -> StoreResult<()> {
    let db: Database<Payload> = Database::new();
    db.save(path, force)?;
    println!("Created {}", path.display());
    Ok(())
}

/// Insert one entry into a snapshot file.
///
/// `payload` is parsed as JSON; anything that is not valid JSON is stored
/// as a string.
pub fn cmd_insert(
    path: &Path,
    position: Position,
    tags: &[String],
    payload: &str,
    json: bool,
) -> StoreResult<()> {
    let db: Database<Payload> = Database::load(path)?;
    let value = serde_json::from_str(payload)
        .unwrap_or_else(|_| serde_json::Value::String(payload.to_string()));
    let entry = db.insert(Entry::new(value, position, tags.iter().cloned()))?;
    db.save(path, true)?;

    if json {
        print_json(&serde_json::json!({
            "inserted": entry_json(&entry),
            "entries": db.len(),
        }));
    } else {
        println!("Inserted {}", one_line(&entry));
    }
    Ok(())
}

/// Display information about a snapshot file.
pub fn cmd_info(path: &Path, json: bool) -> StoreResult<()> {
    let header = SnapshotReader::read_header(path)?;
    let db: Database<Payload> = Database::load(path)?;
    let file_size = std::fs::metadata(path)?.len();
    let store = db.read();
    let counts: Vec<(String, usize)> = store
        .tags()
        .into_iter()
        .map(|t| {
            let n = store.tag_len(&t);
            (t, n)
        })
        .collect();
    let [t_bounds, ..] = store.find_bounds(&[], &Region::all())?;

    if json {
        let tags: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(t, n)| (t.clone(), serde_json::json!(n)))
            .collect();
        print_json(&serde_json::json!({
            "file": path.display().to_string(),
            "version": header.version,
            "saved_at": header.saved_at,
            "entries": store.len(),
            "default_tag": store.config().default_tag,
            "file_size": file_size,
            "time": t_bounds,
            "tags": tags,
        }));
    } else {
        println!("File: {}", path.display());
        println!("Version: {}", header.version);
        println!("Saved at: {}", format_timestamp(header.saved_at));
        println!("Entries: {}", store.len());
        println!("Default tag: {}", store.config().default_tag);
        println!("File size: {}", format_size(file_size));
        println!("Time span: {}", t_bounds);
        println!("Tags:");
        for (tag, n) in &counts {
            println!("  {}: {}", tag, n);
        }
    }
    Ok(())
}

/// Dump entries carrying `tags` in time order, one per line.
pub fn cmd_dump(path: &Path, tags: &[String], output: Option<&Path>, json: bool) -> StoreResult<()> {
    let db: Database<Payload> = Database::load(path)?;
    let entries = db.entries_by_time(&tag_refs(tags));

    let mut out: Box<dyn Write> = match output {
        Some(file) => Box::new(std::io::BufWriter::new(std::fs::File::create(file)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    for entry in &entries {
        if json {
            writeln!(out, "{}", entry_json(entry))?;
        } else {
            writeln!(out, "{}", one_line(entry))?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Range query.
pub fn cmd_query(
    path: &Path,
    tags: &[String],
    region: &Region,
    sort: Option<Axis>,
    limit: usize,
    json: bool,
) -> StoreResult<()> {
    let db: Database<Payload> = Database::load(path)?;
    let tags = tag_refs(tags);
    let mut results = match sort {
        Some(axis) => db.find_entries_sorted(&tags, region, &ByAxis(axis))?,
        None => db.find_entries(&tags, region)?,
    };
    let total = results.len();
    results.truncate(limit);

    if json {
        let items: Vec<serde_json::Value> = results.iter().map(|e| entry_json(e)).collect();
        print_json(&serde_json::json!({
            "region": region.to_string(),
            "count": total,
            "results": items,
        }));
    } else {
        println!("{} entries in {}", total, region);
        for entry in &results {
            println!("  {}", one_line(entry));
        }
        if total > results.len() {
            println!("  ... {} more", total - results.len());
        }
    }
    Ok(())
}

/// Bounding box of matching entries.
pub fn cmd_bounds(path: &Path, tags: &[String], region: &Region, json: bool) -> StoreResult<()> {
    let db: Database<Payload> = Database::load(path)?;
    let bounds = db.find_bounds(&tag_refs(tags), region)?;

    if json {
        let obj: serde_json::Map<String, serde_json::Value> = Axis::ALL
            .iter()
            .map(|a| (a.name().to_string(), bounds_json(&bounds[a.index()])))
            .collect();
        print_json(&serde_json::Value::Object(obj));
    } else {
        for axis in Axis::ALL {
            println!("{}: {}", axis, bounds[axis.index()]);
        }
    }
    Ok(())
}

/// Most recent entry carrying `tag`.
pub fn cmd_last(path: &Path, tag: &str, json: bool) -> StoreResult<()> {
    let db: Database<Payload> = Database::load(path)?;
    let entry = db.last_entry(tag)?;
    if json {
        print_json(&entry_json(&entry));
    } else {
        println!("{}", one_line(&entry));
    }
    Ok(())
}

fn tag_refs(tags: &[String]) -> Vec<&str> {
    tags.iter().map(String::as_str).collect()
}

fn one_line(entry: &Entry<Payload>) -> String {
    let p = &entry.position;
    let tags: Vec<&str> = entry.tags.iter().map(String::as_str).collect();
    format!(
        "{} {} {} {} [{}] {}",
        p.t,
        p.x,
        p.y,
        p.z,
        tags.join(","),
        entry.payload
    )
}

fn entry_json(entry: &EntryRef<Payload>) -> serde_json::Value {
    serde_json::to_value(entry.as_ref()).unwrap_or_default()
}

fn bounds_json(bounds: &Bounds) -> serde_json::Value {
    serde_json::json!({ "min": bounds.min, "max": bounds.max })
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_default()
    );
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else if bytes < 1024 * 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else {
        format!("{:.1} GB", bytes as f64 / (1024.0 * 1024.0 * 1024.0))
    }
}

fn format_timestamp(micros: u64) -> String {
    let secs = (micros / 1_000_000) as i64;
    match chrono::DateTime::from_timestamp(secs, 0) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => format!("{} us", micros),
    }
}
