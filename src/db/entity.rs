//! db::entity
//!
//! Handles to scans, filesets and files.
//!
//! # Design
//!
//! A handle is a [`Location`] plus the [`Database`] it came from. It owns no
//! state of its own: every accessor goes back to the store, so a handle always
//! observes the latest committed state and a deleted entity simply reports
//! `NotFound`. Parent accessors rebuild the parent handle from the location.
//!
//! # Metadata
//!
//! All three levels share the [`Entity`] trait, which provides the metadata
//! contract on top of `location()` and `database()`. Key updates are a
//! read-modify-write under the store lock, so concurrent updates of different
//! keys never lose each other.

use std::path::Path;

use serde_json::Value;

use crate::core::metadata::{FileRecord, Metadata, PayloadKind};
use crate::core::types::{validate_filename, EntityId, Location};

use super::error::DbError;
use super::Database;

/// Behaviour shared by scans, filesets and files.
pub trait Entity {
    /// Full address of the entity.
    fn location(&self) -> &Location;

    /// The database this handle belongs to.
    fn database(&self) -> &Database;

    fn id(&self) -> &EntityId {
        self.location().id()
    }

    /// An owned copy of the whole metadata map.
    fn get_metadata(&self) -> Result<Metadata, DbError> {
        self.database().backend()?.read_metadata(self.location())
    }

    /// Value stored under `key`, `None` if the key is absent.
    fn get_metadata_key(&self, key: &str) -> Result<Option<Value>, DbError> {
        Ok(self.get_metadata()?.remove(key))
    }

    /// Replace the whole metadata map.
    fn replace_metadata(&self, metadata: Metadata) -> Result<(), DbError> {
        let loc = self.location();
        self.database()
            .write(|backend| backend.write_metadata(loc, &metadata))
    }

    /// Insert or overwrite a single key, keeping every other key.
    fn set_metadata_key(&self, key: &str, value: Value) -> Result<(), DbError> {
        let loc = self.location();
        self.database().write(|backend| {
            let mut metadata = backend.read_metadata(loc)?;
            metadata.insert(key.to_string(), value);
            backend.write_metadata(loc, &metadata)
        })
    }
}

macro_rules! entity_handle {
    ($name:ident) => {
        impl $name {
            pub(crate) fn new(db: Database, loc: Location) -> Self {
                Self { db, loc }
            }
        }

        impl Entity for $name {
            fn location(&self) -> &Location {
                &self.loc
            }

            fn database(&self) -> &Database {
                &self.db
            }
        }
    };
}

/// A scan: the top level of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    db: Database,
    loc: Location,
}

/// A named group of files inside a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fileset {
    db: Database,
    loc: Location,
}

/// A leaf entity holding one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    db: Database,
    loc: Location,
}

entity_handle!(Scan);
entity_handle!(Fileset);
entity_handle!(File);

// =============================================================================
// Scan
// =============================================================================

impl Scan {
    fn fileset_location(&self, id: &str) -> Result<Location, DbError> {
        Ok(Location::Fileset {
            scan: self.loc.scan_id().clone(),
            fileset: EntityId::new(id)?,
        })
    }

    /// All filesets of this scan, sorted by id.
    pub fn get_filesets(&self) -> Result<Vec<Fileset>, DbError> {
        Ok(self
            .db
            .list_children(Some(&self.loc))?
            .into_iter()
            .filter_map(|id| self.loc.child(id))
            .map(|loc| Fileset::new(self.db.clone(), loc))
            .collect())
    }

    /// Look up a fileset, creating it when absent and `create` is set.
    pub fn get_fileset(&self, id: &str, create: bool) -> Result<Option<Fileset>, DbError> {
        let loc = self.fileset_location(id)?;
        Ok(self
            .db
            .get_or_create(loc, create)?
            .map(|loc| Fileset::new(self.db.clone(), loc)))
    }

    /// Create a new, empty fileset. Fails with `AlreadyExists` if taken.
    pub fn create_fileset(&self, id: &str) -> Result<Fileset, DbError> {
        let loc = self.fileset_location(id)?;
        self.db.create_entity(&loc)?;
        Ok(Fileset::new(self.db.clone(), loc))
    }

    /// Delete a fileset with all of its files.
    pub fn delete_fileset(&self, id: &str) -> Result<(), DbError> {
        let loc = self.fileset_location(id)?;
        self.db.delete_entity(&loc)
    }
}

// =============================================================================
// Fileset
// =============================================================================

impl Fileset {
    /// The scan this fileset belongs to.
    pub fn scan(&self) -> Scan {
        Scan::new(self.db.clone(), Location::scan(self.loc.scan_id().clone()))
    }

    fn file_location(&self, id: &str) -> Result<Location, DbError> {
        Ok(Location::File {
            scan: self.loc.scan_id().clone(),
            fileset: self.loc.id().clone(),
            file: EntityId::new(id)?,
        })
    }

    /// All files of this fileset, sorted by id.
    pub fn get_files(&self) -> Result<Vec<File>, DbError> {
        Ok(self
            .db
            .list_children(Some(&self.loc))?
            .into_iter()
            .filter_map(|id| self.loc.child(id))
            .map(|loc| File::new(self.db.clone(), loc))
            .collect())
    }

    /// Look up a file, creating it when absent and `create` is set.
    pub fn get_file(&self, id: &str, create: bool) -> Result<Option<File>, DbError> {
        let loc = self.file_location(id)?;
        Ok(self
            .db
            .get_or_create(loc, create)?
            .map(|loc| File::new(self.db.clone(), loc)))
    }

    /// Create a new file with no payload. Fails with `AlreadyExists` if taken.
    pub fn create_file(&self, id: &str) -> Result<File, DbError> {
        let loc = self.file_location(id)?;
        self.db.create_entity(&loc)?;
        Ok(File::new(self.db.clone(), loc))
    }

    /// Delete a file with its payload and metadata.
    pub fn delete_file(&self, id: &str) -> Result<(), DbError> {
        let loc = self.file_location(id)?;
        self.db.delete_entity(&loc)
    }
}

// =============================================================================
// File
// =============================================================================

/// Name under which a payload of `id` is stored.
///
/// `<id>.<ext>` for a non-empty extension. Without one the current filename
/// is kept, falling back to the bare id.
fn payload_filename(
    id: &EntityId,
    ext: &str,
    current: Option<&FileRecord>,
) -> Result<String, DbError> {
    let ext = ext.trim_start_matches('.');
    let name = if !ext.is_empty() {
        format!("{id}.{ext}")
    } else if let Some(record) = current {
        record.filename.clone()
    } else {
        id.to_string()
    };
    validate_filename(&name)?;
    Ok(name)
}

impl File {
    /// The fileset this file belongs to.
    pub fn fileset(&self) -> Fileset {
        let loc = match &self.loc {
            Location::File { scan, fileset, .. } => Location::Fileset {
                scan: scan.clone(),
                fileset: fileset.clone(),
            },
            other => other.clone(),
        };
        Fileset::new(self.db.clone(), loc)
    }

    /// The scan this file belongs to.
    pub fn scan(&self) -> Scan {
        Scan::new(self.db.clone(), Location::scan(self.loc.scan_id().clone()))
    }

    /// Name the payload is stored under, `None` if never written.
    pub fn filename(&self) -> Result<Option<String>, DbError> {
        Ok(self
            .db
            .backend()?
            .file_record(&self.loc)?
            .map(|record| record.filename))
    }

    /// Record describing the current payload, `None` if never written.
    pub fn record(&self) -> Result<Option<FileRecord>, DbError> {
        self.db.backend()?.file_record(&self.loc)
    }

    /// Copy the bytes of an external file in, replacing any payload.
    ///
    /// The filename is `<id>.<source extension>` unless one is already set.
    pub fn import_file(&self, path: impl AsRef<Path>) -> Result<(), DbError> {
        let source = path.as_ref();
        if !source.is_file() {
            return Err(DbError::SourceNotFound(source.to_path_buf()));
        }
        let loc = &self.loc;
        self.db.write(|backend| {
            let current = backend.file_record(loc)?;
            let ext = if current.is_some() {
                ""
            } else {
                source
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or_default()
            };
            let filename = payload_filename(loc.id(), ext, current.as_ref())?;
            backend.import_payload(loc, &filename, source)?;
            Ok(())
        })
    }

    /// Store raw bytes, replacing any payload.
    pub fn write_raw(&self, data: &[u8], ext: &str) -> Result<(), DbError> {
        self.write_payload(data, ext, PayloadKind::Binary)
    }

    /// Current payload bytes. `EmptyFile` if never written.
    pub fn read_raw(&self) -> Result<Vec<u8>, DbError> {
        self.db
            .backend()?
            .read_payload(&self.loc)?
            .map(|(_, data)| data)
            .ok_or_else(|| DbError::EmptyFile(self.loc.to_string()))
    }

    /// Store text as UTF-8, replacing any payload.
    pub fn write(&self, text: &str, ext: &str) -> Result<(), DbError> {
        self.write_payload(text.as_bytes(), ext, PayloadKind::Text)
    }

    /// Current payload decoded as UTF-8.
    ///
    /// `EmptyFile` if never written, `Encoding` if the bytes are not UTF-8.
    pub fn read(&self) -> Result<String, DbError> {
        let data = self.read_raw()?;
        String::from_utf8(data).map_err(|source| DbError::Encoding {
            location: self.loc.to_string(),
            source,
        })
    }

    fn write_payload(&self, data: &[u8], ext: &str, kind: PayloadKind) -> Result<(), DbError> {
        let loc = &self.loc;
        self.db.write(|backend| {
            let current = backend.file_record(loc)?;
            let filename = payload_filename(loc.id(), ext, current.as_ref())?;
            backend.write_payload(loc, &filename, kind, data)?;
            Ok(())
        })
    }
}
