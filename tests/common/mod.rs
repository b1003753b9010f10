//! Shared fixtures for integration tests.
//!
//! [`seed_store`] builds a small reference store; [`TemporaryCloneDb`] copies
//! a store into a fresh temporary directory so each test mutates its own copy.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use tempfile::TempDir;

use romidb::db::{Database, Entity, FsBackend, MemoryBackend};

pub const SCAN: &str = "testscan";
pub const FILESET: &str = "testfileset";
pub const TEXT_FILE: &str = "text";
pub const BINARY_FILE: &str = "image";
pub const TEXT: &str = "hello romidb";
pub const BINARY: &[u8] = &[0x89, b'P', b'N', b'G', 0x00, 0xff];

/// Populate `db` with the reference content.
///
/// ```text
/// testscan            {"species": "arabidopsis"}
///   testfileset       {"camera": "rgb"}
///     text            "hello romidb" stored as text.txt
///     image           PNG-ish bytes stored as image.png, {"exposure": 0.01}
/// ```
pub fn seed(db: &Database) {
    let scan = db.create_scan(SCAN).unwrap();
    scan.set_metadata_key("species", json!("arabidopsis")).unwrap();

    let fileset = scan.create_fileset(FILESET).unwrap();
    fileset.set_metadata_key("camera", json!("rgb")).unwrap();

    fileset.create_file(TEXT_FILE).unwrap().write(TEXT, "txt").unwrap();

    let image = fileset.create_file(BINARY_FILE).unwrap();
    image.write_raw(BINARY, "png").unwrap();
    image.set_metadata_key("exposure", json!(0.01)).unwrap();
}

/// Create a seeded filesystem store at `root`.
pub fn seed_store(root: &Path) {
    FsBackend::init(root, Some("reference store".into())).unwrap();
    let db = Database::open_fs(root);
    db.connect().unwrap();
    seed(&db);
    db.disconnect();
}

/// Recursively copy `src` into `dst`.
pub fn copy_dir(src: &Path, dst: &Path) {
    fs::create_dir_all(dst).unwrap();
    for entry in fs::read_dir(src).unwrap() {
        let entry = entry.unwrap();
        let target = dst.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), &target).unwrap();
        }
    }
}

/// A throwaway copy of a store, removed on drop.
pub struct TemporaryCloneDb {
    dir: TempDir,
}

impl TemporaryCloneDb {
    pub fn new(source: &Path) -> Self {
        let dir = TempDir::new().expect("create temp dir");
        copy_dir(source, dir.path());
        Self { dir }
    }

    /// Clone of a freshly seeded reference store.
    pub fn seeded() -> Self {
        let source = TempDir::new().expect("create temp dir");
        seed_store(source.path());
        Self::new(source.path())
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// A connected database over the clone.
    pub fn connect(&self) -> Database {
        let db = Database::open_fs(self.path());
        db.connect().unwrap();
        db
    }
}

/// A connected database with its backing storage kept alive.
pub struct Fixture {
    pub name: &'static str,
    pub db: Database,
    _dir: Option<TempDir>,
}

/// An empty connected database on every backend.
pub fn empty_backends() -> Vec<Fixture> {
    let dir = TempDir::new().expect("create temp dir");
    FsBackend::init(dir.path(), None).unwrap();
    let fs_db = Database::open_fs(dir.path());
    fs_db.connect().unwrap();

    let memory_db = Database::new(MemoryBackend::new());
    memory_db.connect().unwrap();

    vec![
        Fixture {
            name: "fs",
            db: fs_db,
            _dir: Some(dir),
        },
        Fixture {
            name: "memory",
            db: memory_db,
            _dir: None,
        },
    ]
}

/// A seeded connected database on every backend.
pub fn seeded_backends() -> Vec<Fixture> {
    let fixtures = empty_backends();
    for fixture in &fixtures {
        seed(&fixture.db);
    }
    fixtures
}
