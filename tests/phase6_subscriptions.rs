//! Phase 6 tests: insert subscriptions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use parking_lot::Mutex;

use spacetime_index::{
    Database, Entry, Position, Region, ReplayCursor, SubscriptionId, ALL_TAG, DEFAULT_TAG,
};

fn pos(t: f64) -> Position {
    Position::new(t, 0.0, 0.0, 0.0)
}

/// Subscribe with a callback that records payloads.
fn recorder(db: &Database<u32>, tags: &[&str]) -> (SubscriptionId, Arc<Mutex<Vec<u32>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = db.subscribe(tags, Box::new(move |e| sink.lock().push(e.payload)));
    (id, seen)
}

// ==================== Attach / notify ====================

#[test]
fn test_subscriber_sees_inserts() {
    let db = Database::new();
    let (_, seen) = recorder(&db, &[]);
    assert_eq!(db.subscriber_count(), 1);

    db.insert(Entry::new(1, pos(0.0), ["GPS"])).unwrap();
    db.insert(Entry::untagged(2, pos(1.0))).unwrap();
    assert_eq!(*seen.lock(), vec![1, 2]);
}

#[test]
fn test_existing_entries_are_not_replayed() {
    let db = Database::new();
    db.insert(Entry::new(1u32, pos(0.0), ["GPS"])).unwrap();
    let (_, seen) = recorder(&db, &["GPS"]);
    assert!(seen.lock().is_empty());
    db.insert(Entry::new(2, pos(1.0), ["GPS"])).unwrap();
    assert_eq!(*seen.lock(), vec![2]);
}

#[test]
fn test_failed_insert_is_not_notified() {
    let db = Database::new();
    let (_, seen) = recorder(&db, &[]);
    assert!(db
        .insert(Entry::new(1u32, Position::new(f64::NAN, 0.0, 0.0, 0.0), ["GPS"]))
        .is_err());
    assert!(seen.lock().is_empty());
}

// ==================== Tag filtering ====================

#[test]
fn test_subscriber_tag_filter() {
    let db = Database::new();
    let (_, gps) = recorder(&db, &["GPS"]);
    let (_, uav7_gps) = recorder(&db, &["uav7", "GPS"]);
    let (_, all) = recorder(&db, &[ALL_TAG]);

    db.insert(Entry::new(1, pos(0.0), ["GPS", "uav7"])).unwrap();
    db.insert(Entry::new(2, pos(1.0), ["GPS", "uav8"])).unwrap();
    db.insert(Entry::new(3, pos(2.0), ["SAMPLE", "uav7"])).unwrap();

    assert_eq!(*gps.lock(), vec![1, 2]);
    assert_eq!(*uav7_gps.lock(), vec![1]);
    assert_eq!(*all.lock(), vec![1, 2, 3]);
}

#[test]
fn test_default_tag_is_visible_to_subscribers() {
    let db = Database::new();
    let (_, misc) = recorder(&db, &[DEFAULT_TAG]);
    db.insert(Entry::untagged(4, pos(0.0))).unwrap();
    assert_eq!(*misc.lock(), vec![4]);
}

// ==================== Detach ====================

#[test]
fn test_unsubscribe() {
    let db = Database::new();
    let (id, seen) = recorder(&db, &[]);
    let (_, other) = recorder(&db, &[]);
    db.insert(Entry::new(1, pos(0.0), ["A"])).unwrap();

    assert!(db.unsubscribe(id));
    assert!(!db.unsubscribe(id));
    assert_eq!(db.subscriber_count(), 1);
    db.insert(Entry::new(2, pos(1.0), ["A"])).unwrap();

    assert_eq!(*seen.lock(), vec![1]);
    assert_eq!(*other.lock(), vec![1, 2]);
}

#[test]
fn test_callback_may_unsubscribe_itself() {
    let db: Database<u32> = Database::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let slot = Arc::new(Mutex::new(None));
    let id = {
        let handle = db.clone();
        let calls = Arc::clone(&calls);
        let slot = Arc::clone(&slot);
        db.subscribe(
            &[],
            Box::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                if let Some(id) = slot.lock().take() {
                    handle.unsubscribe(id);
                }
            }),
        )
    };
    *slot.lock() = Some(id);

    db.insert(Entry::new(1, pos(0.0), ["A"])).unwrap();
    db.insert(Entry::new(2, pos(1.0), ["A"])).unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(db.subscriber_count(), 0);
}

// ==================== Lock release ====================

#[test]
fn test_callback_runs_after_write_lock_is_released() {
    let db: Database<u32> = Database::new();
    let counts = Arc::new(Mutex::new(Vec::new()));
    {
        let reader = db.clone();
        let counts = Arc::clone(&counts);
        db.subscribe(
            &["A"],
            Box::new(move |e| {
                // Would deadlock if the inserting thread still held the lock.
                let found = reader
                    .find_entries(&["A"], &Region::time(e.position.t))
                    .unwrap();
                counts.lock().push((reader.len(), found.len()));
            }),
        );
    }
    db.insert(Entry::new(1, pos(0.0), ["A"])).unwrap();
    db.insert(Entry::new(2, pos(1.0), ["A"])).unwrap();
    assert_eq!(*counts.lock(), vec![(1, 1), (2, 1)]);
}

#[test]
fn test_callback_may_insert() {
    let db: Database<u32> = Database::new();
    {
        let target = db.clone();
        db.subscribe(
            &["raw"],
            Box::new(move |e| {
                target
                    .insert(Entry::new(e.payload * 10, e.position, ["derived"]))
                    .unwrap();
            }),
        );
    }
    db.insert(Entry::new(4, pos(0.0), ["raw"])).unwrap();
    assert_eq!(db.len(), 2);
    assert_eq!(db.last_entry("derived").unwrap().payload, 40);
}

#[test]
fn test_write_guard_notifies_when_dropped() {
    let db = Database::new();
    let (_, seen) = recorder(&db, &[]);
    {
        let mut writer = db.write();
        writer.insert(Entry::new(1, pos(0.0), ["A"])).unwrap();
        writer
            .insert_shared(Arc::new(Entry::new(2, pos(1.0), ["A"])))
            .unwrap();
        assert!(seen.lock().is_empty());
    }
    assert_eq!(*seen.lock(), vec![1, 2]);
}

#[test]
fn test_replay_feeds_subscribers() {
    let source = Database::new();
    for i in 0..6u32 {
        source.insert(Entry::new(i, pos(i as f64), ["GPS"])).unwrap();
    }
    let target = Database::new();
    let (_, seen) = recorder(&target, &["GPS"]);
    let mut cursor = ReplayCursor::from_database(&source, &["GPS"]);
    cursor.replay_into(&target, 2.0).unwrap();
    assert_eq!(*seen.lock(), vec![0, 1, 2]);
}

#[test]
fn test_concurrent_inserts_each_notified_once() {
    let db = Database::new();
    let count = Arc::new(AtomicUsize::new(0));
    {
        let count = Arc::clone(&count);
        db.subscribe(
            &[],
            Box::new(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            }),
        );
    }
    let writers: Vec<_> = (0..4u32)
        .map(|w| {
            let db = db.clone();
            thread::spawn(move || {
                for i in 0..100u32 {
                    db.insert(Entry::new(w * 100 + i, pos(i as f64), ["A"]))
                        .unwrap();
                }
            })
        })
        .collect();
    for writer in writers {
        writer.join().unwrap();
    }
    assert_eq!(count.load(Ordering::SeqCst), 400);
}
