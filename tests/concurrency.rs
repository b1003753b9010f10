//! Integration tests for locking and concurrent access.
//!
//! Two `Database` values over the same store act as two connections; the
//! store lock is also taken directly to stand in for another process.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use serde_json::json;

use common::TemporaryCloneDb;
use romidb::core::ops::StoreLock;
use romidb::core::paths::StorePaths;
use romidb::db::{Backend, Database, DbError, Entity, MemoryBackend};

#[test]
fn held_lock_makes_every_mutation_busy() {
    let clone = TemporaryCloneDb::seeded();
    let db = clone.connect();
    let scan = db.get_scan(common::SCAN, false).unwrap().unwrap();
    let fileset = scan.get_fileset(common::FILESET, false).unwrap().unwrap();
    let text = fileset.get_file(common::TEXT_FILE, false).unwrap().unwrap();

    let lock = StoreLock::acquire(&StorePaths::new(clone.root())).unwrap();

    assert!(matches!(db.create_scan("other"), Err(DbError::Busy)));
    assert!(matches!(db.delete_scan(common::SCAN), Err(DbError::Busy)));
    assert!(matches!(scan.create_fileset("x"), Err(DbError::Busy)));
    assert!(matches!(fileset.get_file("new", true), Err(DbError::Busy)));
    assert!(matches!(text.write("changed", "txt"), Err(DbError::Busy)));
    assert!(matches!(
        scan.set_metadata_key("species", json!("tomato")),
        Err(DbError::Busy)
    ));
    assert!(DbError::Busy.is_busy());

    // Reads are unaffected and the state is unchanged
    assert_eq!(db.get_scans().unwrap().len(), 1);
    assert_eq!(text.read().unwrap(), common::TEXT);
    assert_eq!(
        scan.get_metadata_key("species").unwrap(),
        Some(json!("arabidopsis"))
    );
    assert!(fileset.get_file("new", false).unwrap().is_none());

    drop(lock);
    db.create_scan("other").unwrap();
    text.write("changed", "txt").unwrap();
    assert_eq!(text.read().unwrap(), "changed");
}

#[test]
fn two_connections_exclude_each_other() {
    let clone = TemporaryCloneDb::seeded();
    let first = clone.connect();
    let second = clone.connect();
    assert_ne!(first, second);

    // A third handle on the store stands in for another process
    let backend = romidb::db::FsBackend::new(clone.root());
    let guard = backend.lock().unwrap();
    assert!(matches!(second.create_scan("b"), Err(DbError::Busy)));
    assert!(matches!(first.create_scan("a"), Err(DbError::Busy)));
    drop(guard);

    first.create_scan("a").unwrap();
    assert!(second.get_scan("a", false).unwrap().is_some());
}

#[test]
fn memory_connections_share_the_lock() {
    let store = MemoryBackend::new();
    let a = Database::new(store.clone());
    let b = Database::new(store.clone());
    a.connect().unwrap();
    b.connect().unwrap();

    let guard = store.lock().unwrap();
    assert!(matches!(a.create_scan("s"), Err(DbError::Busy)));
    drop(guard);

    a.create_scan("s").unwrap();
    assert!(b.get_scan("s", false).unwrap().is_some());
}

#[test]
fn concurrent_get_or_create_on_filesystem() {
    let clone = TemporaryCloneDb::seeded();
    let db = clone.connect();
    let scan = db.get_scan(common::SCAN, false).unwrap().unwrap();
    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let scan = scan.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                scan.get_fileset("shared", true).unwrap().unwrap()
            })
        })
        .collect();

    let filesets: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(filesets.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(scan.get_filesets().unwrap().len(), 2);
}

#[test]
fn concurrent_key_updates_are_not_lost() {
    let clone = TemporaryCloneDb::seeded();
    let db = clone.connect();
    let scan = db.get_scan(common::SCAN, false).unwrap().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let scan = scan.clone();
            thread::spawn(move || scan.set_metadata_key(&format!("k{i}"), json!(i)))
        })
        .collect();
    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let metadata = scan.get_metadata().unwrap();
    assert_eq!(metadata.len(), 9);
    for i in 0..8 {
        assert_eq!(metadata[&format!("k{i}")], json!(i));
    }
}

#[test]
fn connect_and_disconnect_are_idempotent() {
    let clone = TemporaryCloneDb::seeded();
    let db = clone.connect();
    db.connect().unwrap();
    assert!(db.is_connected());

    db.disconnect();
    db.disconnect();
    assert!(!db.is_connected());
    assert!(matches!(db.get_scans(), Err(DbError::NotConnected)));

    db.connect().unwrap();
    assert_eq!(db.get_scans().unwrap().len(), 1);
}
