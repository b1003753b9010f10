//! db::backend
//!
//! Storage capability trait.
//!
//! # Design
//!
//! A [`Backend`] persists the scan/fileset/file tree for one store. It is
//! addressed purely by [`Location`], so the entity handles never see how or
//! where things are stored. The [`Database`](super::Database) layers
//! connection state, write locking, and create-if-missing semantics on top.
//!
//! # Contract
//!
//! Implementations must:
//! - Map every `Location` to a unique persisted place
//! - Never expose a partially written entity, document or payload to readers
//! - Make writes durable before returning
//! - Provide a store-wide lock that is visible to every connection against the
//!   same store and fails fast with [`DbError::Busy`] when contended
//! - List children sorted by id
//!
//! Backends do not lock on their own; the `Database` holds the write guard
//! around every mutation.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use crate::core::metadata::{FileRecord, Metadata, PayloadKind};
use crate::core::types::{EntityId, Location};

use super::error::DbError;

/// Held store lock. Dropping it releases the lock.
pub trait WriteGuard: Send + fmt::Debug {}

/// Persistence capability for one store.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Check that the store is reachable and well-formed.
    ///
    /// Returns [`DbError::Connection`] otherwise. Called by `connect`.
    fn open(&self) -> Result<(), DbError>;

    /// Release any resources held for the connection.
    fn close(&self) {}

    /// Acquire the store-wide write lock without blocking.
    ///
    /// Returns [`DbError::Busy`] if it is held elsewhere.
    fn lock(&self) -> Result<Box<dyn WriteGuard>, DbError>;

    /// Ids of the children of `parent` (scans for `None`), sorted.
    fn list(&self, parent: Option<&Location>) -> Result<Vec<EntityId>, DbError>;

    fn exists(&self, loc: &Location) -> Result<bool, DbError>;

    /// Create an empty entity.
    ///
    /// Fails with `AlreadyExists` if taken and `NotFound` if the parent is gone.
    fn create(&self, loc: &Location) -> Result<(), DbError>;

    /// Remove an entity with all of its descendants, metadata and payloads.
    ///
    /// Fails with `NotFound` if absent.
    fn remove(&self, loc: &Location) -> Result<(), DbError>;

    /// Read an entity's metadata map. `NotFound` if the entity is absent.
    fn read_metadata(&self, loc: &Location) -> Result<Metadata, DbError>;

    /// Replace an entity's metadata map. `NotFound` if the entity is absent.
    fn write_metadata(&self, loc: &Location, metadata: &Metadata) -> Result<(), DbError>;

    /// Current payload record of a file, `None` if never written.
    fn file_record(&self, loc: &Location) -> Result<Option<FileRecord>, DbError>;

    /// Current payload of a file with its record, `None` if never written.
    fn read_payload(&self, loc: &Location) -> Result<Option<(FileRecord, Vec<u8>)>, DbError>;

    /// Replace a file's payload, storing it under `filename`.
    fn write_payload(
        &self,
        loc: &Location,
        filename: &str,
        kind: PayloadKind,
        data: &[u8],
    ) -> Result<FileRecord, DbError>;

    /// Replace a file's payload with the bytes of `source`.
    ///
    /// Fails with `SourceNotFound` if `source` does not exist.
    fn import_payload(
        &self,
        loc: &Location,
        filename: &str,
        source: &Path,
    ) -> Result<FileRecord, DbError> {
        let data = fs::read(source).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => DbError::SourceNotFound(source.to_path_buf()),
            _ => DbError::Io(e),
        })?;
        self.write_payload(loc, filename, PayloadKind::Imported, &data)
    }
}
