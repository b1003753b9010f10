//! db::fs
//!
//! Filesystem backend.
//!
//! # Layout
//!
//! See [`crate::core::paths`] for the directory layout. Scans, filesets and
//! files are directories; metadata and file records are JSON documents; a
//! payload is stored under its filename in the file's `payload/` directory.
//!
//! # Consistency
//!
//! - Creating an entity is a single `mkdir`, so it either exists or it does not
//! - Documents and payloads are replaced with write-to-temp + fsync + rename
//! - Deleting renames the subtree to a hidden name before removing it, so
//!   readers never list a half-deleted entity
//! - The store lock is an advisory lock on `<root>/lock` (see
//!   [`StoreLock`])

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::config::{Config, StoreConfig};
use crate::core::metadata::{FileRecord, Metadata, MetadataStore, PayloadKind};
use crate::core::ops::{copy_atomic, write_atomic, StoreLock};
use crate::core::paths::StorePaths;
use crate::core::types::{EntityId, Location};

use super::backend::{Backend, WriteGuard};
use super::error::DbError;

impl WriteGuard for StoreLock {}

/// Store kept in a directory tree on a local or shared filesystem.
#[derive(Debug, Clone)]
pub struct FsBackend {
    paths: StorePaths,
}

impl FsBackend {
    /// Backend for an existing store at `root`.
    ///
    /// Nothing is touched until [`Backend::open`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            paths: StorePaths::new(root.into()),
        }
    }

    /// Create a new store at `root`, or validate an existing one.
    ///
    /// Creates the directory if needed and writes `romidb.toml`.
    pub fn init(root: impl Into<PathBuf>, description: Option<String>) -> Result<Self, DbError> {
        let backend = Self::new(root);
        let root = backend.paths.root();

        if backend.paths.store_config_path().exists() {
            Config::read_store(&backend.paths)?;
            debug!(root = %root.display(), "store already initialized");
            return Ok(backend);
        }

        fs::create_dir_all(root)?;
        let config = StoreConfig {
            description,
            ..StoreConfig::default()
        };
        Config::write_store(&backend.paths, &config)?;
        debug!(root = %root.display(), "initialized store");
        Ok(backend)
    }

    pub fn paths(&self) -> &StorePaths {
        &self.paths
    }

    /// Read the store configuration.
    pub fn store_config(&self) -> Result<StoreConfig, DbError> {
        Ok(Config::read_store(&self.paths)?)
    }

    fn documents(&self) -> MetadataStore<'_> {
        MetadataStore::new(&self.paths)
    }

    fn ensure_exists(&self, loc: &Location) -> Result<PathBuf, DbError> {
        let dir = self.paths.entity_dir(loc);
        if dir.is_dir() {
            Ok(dir)
        } else {
            Err(DbError::not_found(loc))
        }
    }

    /// Path a payload is written to, creating the payload directory.
    fn payload_target(&self, loc: &Location, filename: &str) -> Result<PathBuf, DbError> {
        fs::create_dir_all(self.paths.payload_dir(loc))?;
        Ok(self.paths.payload_path(loc, filename))
    }

    /// Point the record at the new payload and drop the previous payload
    /// if it lived under another name.
    fn commit_payload(
        &self,
        loc: &Location,
        previous: Option<FileRecord>,
        record: FileRecord,
    ) -> Result<FileRecord, DbError> {
        self.documents().write_record(loc, &record)?;

        if let Some(previous) = previous {
            if previous.filename != record.filename {
                let stale = self.paths.payload_path(loc, &previous.filename);
                match fs::remove_file(&stale) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => warn!(path = %stale.display(), error = %e, "failed to remove stale payload"),
                }
            }
        }

        debug!(location = %loc, filename = %record.filename, size = record.size, "wrote payload");
        Ok(record)
    }
}

impl Backend for FsBackend {
    fn open(&self) -> Result<(), DbError> {
        let root = self.paths.root();
        if !root.is_dir() {
            return Err(DbError::Connection(format!(
                "{} does not exist or is not a directory",
                root.display()
            )));
        }
        self.store_config()?;
        Ok(())
    }

    fn lock(&self) -> Result<Box<dyn WriteGuard>, DbError> {
        Ok(Box::new(StoreLock::acquire(&self.paths)?))
    }

    fn list(&self, parent: Option<&Location>) -> Result<Vec<EntityId>, DbError> {
        if parent.is_some_and(|p| p.child_kind().is_none()) {
            return Ok(Vec::new());
        }

        let dir = self.paths.children_dir(parent);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return match parent {
                    Some(loc) => Err(DbError::not_found(loc)),
                    None => Err(DbError::Io(e)),
                };
            }
            Err(e) => return Err(DbError::Io(e)),
        };

        let mut ids = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if StorePaths::is_hidden(name) {
                continue;
            }
            // Directories that are not valid ids were not created by us
            if let Ok(id) = EntityId::new(name) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, loc: &Location) -> Result<bool, DbError> {
        Ok(self.paths.entity_dir(loc).is_dir())
    }

    fn create(&self, loc: &Location) -> Result<(), DbError> {
        if let Some(parent) = loc.parent() {
            self.ensure_exists(&parent)?;
        }

        match fs::create_dir(self.paths.entity_dir(loc)) {
            Ok(()) => {
                debug!(location = %loc, kind = %loc.kind(), "created entity");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Err(DbError::already_exists(loc)),
            Err(e) => Err(DbError::Io(e)),
        }
    }

    fn remove(&self, loc: &Location) -> Result<(), DbError> {
        let dir = self.ensure_exists(loc)?;
        let trash = self.paths.trash_path_for(loc);

        match fs::rename(&dir, &trash) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(DbError::not_found(loc)),
            Err(e) => return Err(DbError::Io(e)),
        }

        // The entity is gone as soon as the rename lands; leftovers stay hidden
        if let Err(e) = fs::remove_dir_all(&trash) {
            warn!(path = %trash.display(), error = %e, "failed to purge deleted entity");
        }
        debug!(location = %loc, kind = %loc.kind(), "deleted entity");
        Ok(())
    }

    fn read_metadata(&self, loc: &Location) -> Result<Metadata, DbError> {
        self.ensure_exists(loc)?;
        Ok(self.documents().read(loc)?)
    }

    fn write_metadata(&self, loc: &Location, metadata: &Metadata) -> Result<(), DbError> {
        self.ensure_exists(loc)?;
        self.documents().write(loc, metadata)?;
        debug!(location = %loc, keys = metadata.len(), "wrote metadata");
        Ok(())
    }

    fn file_record(&self, loc: &Location) -> Result<Option<FileRecord>, DbError> {
        self.ensure_exists(loc)?;
        Ok(self.documents().read_record(loc)?)
    }

    fn read_payload(&self, loc: &Location) -> Result<Option<(FileRecord, Vec<u8>)>, DbError> {
        self.ensure_exists(loc)?;

        // A writer switching filenames may remove the payload named by the
        // record we just read; the second pass sees the new record.
        for _ in 0..2 {
            let Some(record) = self.documents().read_record(loc)? else {
                return Ok(None);
            };
            match fs::read(self.paths.payload_path(loc, &record.filename)) {
                Ok(data) => return Ok(Some((record, data))),
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(DbError::Io(e)),
            }
        }

        if self.exists(loc)? {
            Err(DbError::Metadata(format!(
                "payload of {} is missing from the store",
                loc
            )))
        } else {
            Err(DbError::not_found(loc))
        }
    }

    fn write_payload(
        &self,
        loc: &Location,
        filename: &str,
        kind: PayloadKind,
        data: &[u8],
    ) -> Result<FileRecord, DbError> {
        self.ensure_exists(loc)?;
        let previous = self.documents().read_record(loc)?;

        write_atomic(&self.payload_target(loc, filename)?, data)?;
        let record = FileRecord::new(filename, kind, data.len() as u64);
        self.commit_payload(loc, previous, record)
    }

    fn import_payload(
        &self,
        loc: &Location,
        filename: &str,
        source: &Path,
    ) -> Result<FileRecord, DbError> {
        self.ensure_exists(loc)?;
        if !source.is_file() {
            return Err(DbError::SourceNotFound(source.to_path_buf()));
        }
        let previous = self.documents().read_record(loc)?;
        let target = self.payload_target(loc, filename)?;

        let size = copy_atomic(source, &target).map_err(|e| {
            match e.kind() {
                io::ErrorKind::NotFound => DbError::SourceNotFound(source.to_path_buf()),
                _ => DbError::Io(e),
            }
        })?;
        let record = FileRecord::new(filename, PayloadKind::Imported, size);
        self.commit_payload(loc, previous, record)
    }
}
