//! core::metadata::store
//!
//! JSON document storage for a filesystem store.
//!
//! # Architecture
//!
//! Each entity keeps its metadata in `<entity_dir>/metadata.json`; a file
//! entity additionally keeps its payload record in `<file_dir>/file.json`.
//! Paths come from [`StorePaths`]. All writes go through
//! [`write_atomic`](crate::core::ops::atomic::write_atomic) so a concurrent
//! reader never sees a torn document.
//!
//! This store performs no locking. Callers hold the store lock around
//! read-modify-write sequences.
//!
//! # Example
//!
//! ```ignore
//! use romidb::core::metadata::store::MetadataStore;
//!
//! let store = MetadataStore::new(&paths);
//! let mut meta = store.read(&loc)?;
//! meta.insert("exposure".into(), 0.01.into());
//! store.write(&loc, &meta)?;
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use super::schema::{metadata_to_json, parse_metadata, FileRecord, Metadata, MetadataError};
use crate::core::ops::atomic::write_atomic;
use crate::core::paths::StorePaths;
use crate::core::types::Location;

/// Errors from document storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error on '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("corrupt document '{path}': {source}")]
    Corrupt {
        path: PathBuf,
        source: MetadataError,
    },
}

/// Metadata and file-record documents of a filesystem store.
#[derive(Debug, Clone, Copy)]
pub struct MetadataStore<'a> {
    paths: &'a StorePaths,
}

impl<'a> MetadataStore<'a> {
    pub fn new(paths: &'a StorePaths) -> Self {
        Self { paths }
    }

    /// Read an entity's metadata.
    ///
    /// A missing document reads as an empty map.
    pub fn read(&self, loc: &Location) -> Result<Metadata, StoreError> {
        let path = self.paths.metadata_path(loc);
        match read_optional(&path)? {
            Some(json) => {
                parse_metadata(&json).map_err(|source| StoreError::Corrupt { path, source })
            }
            None => Ok(Metadata::new()),
        }
    }

    /// Replace an entity's metadata document.
    pub fn write(&self, loc: &Location, metadata: &Metadata) -> Result<(), StoreError> {
        let path = self.paths.metadata_path(loc);
        let json = metadata_to_json(metadata).map_err(|source| StoreError::Corrupt {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, json.as_bytes()).map_err(|source| StoreError::Io { path, source })
    }

    /// Read a file entity's payload record, `None` if nothing was written yet.
    pub fn read_record(&self, loc: &Location) -> Result<Option<FileRecord>, StoreError> {
        let path = self.paths.file_record_path(loc);
        match read_optional(&path)? {
            Some(json) => FileRecord::parse(&json)
                .map(Some)
                .map_err(|source| StoreError::Corrupt { path, source }),
            None => Ok(None),
        }
    }

    /// Replace a file entity's payload record.
    pub fn write_record(&self, loc: &Location, record: &FileRecord) -> Result<(), StoreError> {
        let path = self.paths.file_record_path(loc);
        let json = record
            .to_canonical_json()
            .map_err(|source| StoreError::Corrupt {
                path: path.clone(),
                source,
            })?;
        write_atomic(&path, json.as_bytes()).map_err(|source| StoreError::Io { path, source })
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StoreError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(StoreError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metadata::schema::PayloadKind;
    use serde_json::json;
    use tempfile::TempDir;

    fn setup() -> (TempDir, StorePaths, Location) {
        let temp = TempDir::new().expect("create temp dir");
        let paths = StorePaths::new(temp.path().to_path_buf());
        let loc = Location::parse("scan/fs/file").unwrap();
        fs::create_dir_all(paths.entity_dir(&loc)).unwrap();
        (temp, paths, loc)
    }

    #[test]
    fn missing_metadata_is_empty() {
        let (_temp, paths, loc) = setup();
        let store = MetadataStore::new(&paths);
        assert!(store.read(&loc).unwrap().is_empty());
    }

    #[test]
    fn write_then_read() {
        let (_temp, paths, loc) = setup();
        let store = MetadataStore::new(&paths);

        let mut meta = Metadata::new();
        meta.insert("k".into(), json!("v"));
        meta.insert("n".into(), json!({"a": [1, 2]}));
        store.write(&loc, &meta).unwrap();

        assert_eq!(store.read(&loc).unwrap(), meta);
    }

    #[test]
    fn corrupt_metadata_is_reported() {
        let (_temp, paths, loc) = setup();
        fs::write(paths.metadata_path(&loc), "[]").unwrap();

        let err = MetadataStore::new(&paths).read(&loc).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
        assert!(err.to_string().contains("metadata.json"));
    }

    #[test]
    fn record_absent_then_present() {
        let (_temp, paths, loc) = setup();
        let store = MetadataStore::new(&paths);
        assert!(store.read_record(&loc).unwrap().is_none());

        let record = FileRecord::new("file.txt", PayloadKind::Text, 3);
        store.write_record(&loc, &record).unwrap();
        assert_eq!(store.read_record(&loc).unwrap(), Some(record));
    }

    #[test]
    fn write_into_missing_entity_is_io_error() {
        let (_temp, paths, _) = setup();
        let missing = Location::parse("other").unwrap();
        let err = MetadataStore::new(&paths)
            .write(&missing, &Metadata::new())
            .unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
