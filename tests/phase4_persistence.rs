//! Phase 4 tests: snapshot files, atomic saves and periodic saving.

use std::path::Path;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use spacetime_index::format::part_path;
use spacetime_index::{
    Database, Entry, Position, Region, Snapshot, SnapshotReader, SnapshotWriter, SpatialStore,
    StoreConfig, StoreError, ALL_TAG,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Sample {
    label: String,
    value: f64,
    samples: Vec<u16>,
}

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn sample(i: u32) -> Sample {
    Sample {
        label: format!("sample-{i}"),
        value: i as f64 * 0.5,
        samples: (0..(i % 7) as u16).collect(),
    }
}

fn filled_db(n: u32) -> Database<Sample> {
    let db = Database::new();
    for i in 0..n {
        let tags: Vec<String> = match i % 3 {
            0 => vec!["SAMPLE".into(), "uav7".into()],
            1 => vec!["GPS".into(), "uav7".into()],
            _ => vec!["GPS".into(), "uav8".into(), "réseau".into()],
        };
        let position = Position::new(i as f64, (i * 3) as f64, -(i as f64), 500.0 + i as f64);
        db.insert(Entry::new(sample(i), position, tags)).unwrap();
    }
    db
}

fn wait_for(path: &Path) -> bool {
    for _ in 0..200 {
        if path.exists() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

// ==================== Round trip ====================

#[test]
fn test_save_load_round_trip() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flight.stdb");

    let db = filled_db(100);
    db.save(&path, false).unwrap();
    assert!(path.exists());
    assert!(!part_path(&path).exists());

    let loaded: Database<Sample> = Database::load(&path).unwrap();
    assert_eq!(loaded.len(), 100);
    assert_eq!(loaded.tags(), db.tags());

    let original = db.read();
    let restored = loaded.read();
    for (a, b) in original.entries().iter().zip(restored.entries()) {
        assert_eq!(**a, **b);
    }
    drop((original, restored));

    let tag_sets: [&[&str]; 5] = [&["GPS"], &["uav7"], &["GPS", "uav8"], &[], &["réseau"]];
    for tags in tag_sets {
        let region = Region::time(10.0..=60.0);
        let mut before: Vec<String> = db
            .find_entries(tags, &region)
            .unwrap()
            .iter()
            .map(|e| e.payload.label.clone())
            .collect();
        let mut after: Vec<String> = loaded
            .find_entries(tags, &region)
            .unwrap()
            .iter()
            .map(|e| e.payload.label.clone())
            .collect();
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }
    assert_eq!(
        loaded.last_entry("uav8").unwrap().payload,
        db.last_entry("uav8").unwrap().payload
    );
}

#[test]
fn test_round_trip_empty_store() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("empty.stdb");
    let db: Database<Sample> = Database::new();
    db.save(&path, false).unwrap();

    let loaded: Database<Sample> = Database::load(&path).unwrap();
    assert!(loaded.is_empty());
    assert!(matches!(
        loaded.last_entry(ALL_TAG),
        Err(StoreError::NoEntries(_))
    ));
}

#[test]
fn test_header_records_counts_and_reorder_period() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("header.stdb");
    let mut store = SpatialStore::with_config(StoreConfig::default().reorder_period(25));
    for i in 0..10u32 {
        store
            .insert(Entry::new(i, Position::new(i as f64, 0.0, 0.0, 0.0), ["A", "B"]))
            .unwrap();
    }
    store.save(&path, false).unwrap();

    let header = SnapshotReader::read_header(&path).unwrap();
    assert_eq!(header.entry_count, 10);
    assert_eq!(header.tag_count, 2);
    assert_eq!(header.reorder_period, 25);
    assert!(header.saved_at > 0);

    let loaded: SpatialStore<u32> = SpatialStore::load(&path).unwrap();
    assert_eq!(loaded.config().reorder_period, 25);
}

#[test]
fn test_default_tag_survives_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("default-tag.stdb");
    let config = StoreConfig::default().reorder_period(7).default_tag("unsorted");
    let mut store = SpatialStore::with_config(config.clone());
    store
        .insert(Entry::new(1u32, Position::new(0.0, 0.0, 0.0, 0.0), Vec::<String>::new()))
        .unwrap();
    assert_eq!(store.tags(), vec!["unsorted".to_string()]);
    store.save(&path, false).unwrap();

    let mut loaded: SpatialStore<u32> = SpatialStore::load(&path).unwrap();
    assert_eq!(loaded.config(), &config);
    assert_eq!(loaded.tags(), vec!["unsorted".to_string()]);

    // Entries inserted after the reload still get the saved default tag.
    loaded
        .insert(Entry::untagged(2, Position::new(1.0, 0.0, 0.0, 0.0)))
        .unwrap();
    assert_eq!(loaded.tag_len("unsorted"), 2);

    let db = Database::<u32>::load(&path).unwrap();
    db.insert(Entry::untagged(3, Position::new(2.0, 0.0, 0.0, 0.0)))
        .unwrap();
    assert_eq!(db.last_entry("unsorted").unwrap().payload, 3);
}

#[test]
fn test_write_to_and_read_from_memory() {
    let db = filled_db(12);
    let entries = db.read().entries().to_vec();
    let mut buf = Vec::new();
    SnapshotWriter::new(&StoreConfig::default())
        .write_to(&entries, &mut buf)
        .unwrap();

    let snapshot: Snapshot<Sample> = SnapshotReader::read_from(&mut buf.as_slice()).unwrap();
    assert_eq!(snapshot.entries.len(), 12);
    assert_eq!(snapshot.default_tag, spacetime_index::DEFAULT_TAG);
    assert_eq!(snapshot.entries[5].payload, sample(5));
    assert_eq!(snapshot.entries[5].position, entries[5].position);
}

// ==================== Overwrite protection ====================

#[test]
fn test_save_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taken.stdb");
    std::fs::write(&path, b"precious").unwrap();

    let db = filled_db(3);
    let err = db.save(&path, false).unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
    assert_eq!(std::fs::read(&path).unwrap(), b"precious");
    assert!(!part_path(&path).exists());
}

#[test]
fn test_save_force_overwrites() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("taken.stdb");
    std::fs::write(&path, b"stale").unwrap();

    filled_db(4).save(&path, true).unwrap();
    let loaded: Database<Sample> = Database::load(&path).unwrap();
    assert_eq!(loaded.len(), 4);
}

// ==================== Corrupt files ====================

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nothing-here.stdb");
    let err = Database::<Sample>::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::SnapshotNotFound(_)));
}

#[test]
fn test_load_bad_magic() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.stdb");
    filled_db(3).save(&path, false).unwrap();
    let mut data = std::fs::read(&path).unwrap();
    data[0..4].copy_from_slice(b"NOPE");
    std::fs::write(&path, &data).unwrap();

    let err = Database::<Sample>::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::InvalidMagic));
}

#[test]
fn test_load_unsupported_version() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("future.stdb");
    filled_db(3).save(&path, false).unwrap();
    let mut data = std::fs::read(&path).unwrap();
    data[4..8].copy_from_slice(&99u32.to_le_bytes());
    std::fs::write(&path, &data).unwrap();

    let err = Database::<Sample>::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::UnsupportedVersion(99)));
}

#[test]
fn test_load_truncated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("short.stdb");
    filled_db(10).save(&path, false).unwrap();
    let data = std::fs::read(&path).unwrap();

    std::fs::write(&path, &data[..data.len() - 5]).unwrap();
    let err = Database::<Sample>::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::Truncated));

    std::fs::write(&path, &data[..20]).unwrap();
    let err = Database::<Sample>::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::Truncated));
}

#[test]
fn test_load_checksum_mismatch() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("flipped.stdb");
    filled_db(10).save(&path, false).unwrap();
    let mut data = std::fs::read(&path).unwrap();
    let last = data.len() - 1;
    data[last] ^= 0xFF;
    std::fs::write(&path, &data).unwrap();

    let err = Database::<Sample>::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::ChecksumMismatch { .. }));
}

#[test]
fn test_load_trailing_garbage() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("long.stdb");
    filled_db(2).save(&path, false).unwrap();
    let mut data = std::fs::read(&path).unwrap();
    data.extend_from_slice(b"junk");
    std::fs::write(&path, &data).unwrap();

    let err = Database::<Sample>::load(&path).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}

// ==================== Periodic save ====================

#[test]
fn test_periodic_save_writes_on_tick() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("periodic.stdb");
    let db = filled_db(5);

    db.enable_periodic_save(&path, Duration::from_millis(50), false)
        .unwrap();
    assert!(db.is_periodic_save_enabled());
    assert!(wait_for(&path), "no periodic save happened");

    db.disable_periodic_save().unwrap();
    assert!(!db.is_periodic_save_enabled());
}

#[test]
fn test_disable_periodic_save_does_final_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("final.stdb");
    let db = filled_db(5);

    db.enable_periodic_save(&path, Duration::from_secs(3600), false)
        .unwrap();
    db.insert(Entry::new(
        sample(99),
        Position::new(99.0, 0.0, 0.0, 0.0),
        ["late"],
    ))
    .unwrap();
    db.disable_periodic_save().unwrap();

    let loaded: Database<Sample> = Database::load(&path).unwrap();
    assert_eq!(loaded.len(), 6);
    assert_eq!(loaded.last_entry("late").unwrap().payload, sample(99));
}

#[test]
fn test_no_save_after_disable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("quiet.stdb");
    let db = filled_db(5);

    db.enable_periodic_save(&path, Duration::from_millis(20), false)
        .unwrap();
    thread::sleep(Duration::from_millis(50));
    db.disable_periodic_save().unwrap();
    assert!(path.exists());

    std::fs::remove_file(&path).unwrap();
    thread::sleep(Duration::from_millis(100));
    assert!(!path.exists());
    assert!(!part_path(&path).exists());
}

#[test]
fn test_disable_is_idempotent() {
    let db = filled_db(1);
    db.disable_periodic_save().unwrap();

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("twice.stdb");
    db.enable_periodic_save(&path, Duration::from_secs(3600), false)
        .unwrap();
    db.disable_periodic_save().unwrap();
    db.disable_periodic_save().unwrap();
    assert!(!db.is_periodic_save_enabled());
}

#[test]
fn test_enable_twice_is_rejected() {
    let dir = TempDir::new().unwrap();
    let db = filled_db(1);
    db.enable_periodic_save(&dir.path().join("a.stdb"), Duration::from_secs(3600), false)
        .unwrap();
    let err = db
        .enable_periodic_save(&dir.path().join("b.stdb"), Duration::from_secs(3600), false)
        .unwrap_err();
    assert!(matches!(err, StoreError::PeriodicSaveActive));
    db.disable_periodic_save().unwrap();
    assert!(!dir.path().join("b.stdb").exists());
}

#[test]
fn test_enable_refuses_existing_file_unless_forced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("exists.stdb");
    std::fs::write(&path, b"keep me").unwrap();
    let db = filled_db(2);

    let err = db
        .enable_periodic_save(&path, Duration::from_secs(3600), false)
        .unwrap_err();
    assert!(matches!(err, StoreError::AlreadyExists(_)));
    assert!(!db.is_periodic_save_enabled());
    assert_eq!(std::fs::read(&path).unwrap(), b"keep me");

    db.enable_periodic_save(&path, Duration::from_secs(3600), true)
        .unwrap();
    db.disable_periodic_save().unwrap();
    let loaded: Database<Sample> = Database::load(&path).unwrap();
    assert_eq!(loaded.len(), 2);
}

#[test]
fn test_dropping_database_saves_one_last_time() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dropped.stdb");
    {
        let db = filled_db(7);
        db.enable_periodic_save(&path, Duration::from_secs(3600), false)
            .unwrap();
        let clone = db.clone();
        drop(db);
        // Another handle is alive: nothing saved yet.
        assert!(!path.exists());
        clone.insert(Entry::untagged(sample(7), Position::new(7.0, 0.0, 0.0, 0.0)))
            .unwrap();
    }
    let loaded: Database<Sample> = Database::load(&path).unwrap();
    assert_eq!(loaded.len(), 8);
}

#[test]
fn test_concurrent_inserts_during_periodic_save() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("busy.stdb");
    let db: Database<Sample> = Database::new();
    db.enable_periodic_save(&path, Duration::from_millis(5), false)
        .unwrap();

    let writers: Vec<_> = (0..4u32)
        .map(|w| {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..250u32 {
                    let n = w * 1000 + i;
                    db.insert(Entry::new(
                        sample(n),
                        Position::new(n as f64, 0.0, 0.0, 0.0),
                        [format!("writer{w}")],
                    ))
                    .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    db.disable_periodic_save().unwrap();

    let loaded: Database<Sample> = Database::load(&path).unwrap();
    assert_eq!(loaded.len(), 1000);
    assert_eq!(loaded.tags().len(), 4);
}
