//! db
//!
//! The database API: a store holds scans, a scan holds filesets, a fileset
//! holds files, and every level carries a metadata map.
//!
//! # Modules
//!
//! - [`backend`] - Storage capability trait
//! - [`fs`] - Filesystem backend
//! - [`memory`] - In-memory backend for tests
//! - [`entity`] - Scan, Fileset and File handles
//! - [`error`] - Error taxonomy
//!
//! # Concurrency
//!
//! - Every mutation holds the store-wide lock for its duration. Contention
//!   with another connection or process fails fast with [`DbError::Busy`].
//! - Writers on the same connection queue on an in-process gate before
//!   trying the store lock, so a connection never reports busy against itself.
//! - Reads take no lock; backends guarantee they never see a partial write.
//! - Concurrent `get_*(id, true)` calls for the same id on one connection are
//!   serialized by a creation lock keyed by location, so exactly one creation
//!   happens.
//!
//! # Example
//!
//! ```
//! use romidb::db::{Database, Entity, MemoryBackend};
//!
//! let db = Database::new(MemoryBackend::new());
//! db.connect().unwrap();
//!
//! let scan = db.get_scan("scan1", true).unwrap().unwrap();
//! let images = scan.get_fileset("images", true).unwrap().unwrap();
//! let file = images.create_file("rgb_0001").unwrap();
//! file.write_raw(&[0xff, 0xd8], "jpg").unwrap();
//! file.set_metadata_key("exposure", 0.01.into()).unwrap();
//!
//! assert_eq!(file.read_raw().unwrap(), vec![0xff, 0xd8]);
//! assert_eq!(file.filename().unwrap().as_deref(), Some("rgb_0001.jpg"));
//! ```

pub mod backend;
pub mod entity;
pub mod error;
pub mod fs;
pub mod memory;

pub use backend::{Backend, WriteGuard};
pub use entity::{Entity, File, Fileset, Scan};
pub use error::DbError;
pub use fs::FsBackend;
pub use memory::MemoryBackend;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::core::types::{EntityId, Location};

/// Handle to a store.
///
/// Cheap to clone; clones share one connection. Entity handles obtained from
/// a `Database` refer back to it and fail with [`DbError::NotConnected`]
/// once it is disconnected.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DbInner>,
}

struct DbInner {
    backend: Box<dyn Backend>,
    connected: AtomicBool,
    /// Serializes writers of this connection.
    write_gate: Mutex<()>,
    /// Per-location creation locks for get-or-create.
    creating: Mutex<HashMap<Location, Arc<Mutex<()>>>>,
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("backend", &self.inner.backend)
            .field("connected", &self.is_connected())
            .finish()
    }
}

impl PartialEq for Database {
    /// Two handles are equal when they share one connection.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Database {}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Database {
    /// Create a disconnected handle over `backend`.
    pub fn new(backend: impl Backend + 'static) -> Self {
        Self {
            inner: Arc::new(DbInner {
                backend: Box::new(backend),
                connected: AtomicBool::new(false),
                write_gate: Mutex::new(()),
                creating: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Create a disconnected handle over the filesystem store at `root`.
    pub fn open_fs(root: impl Into<PathBuf>) -> Self {
        Self::new(FsBackend::new(root))
    }

    // =========================================================================
    // Connection lifecycle
    // =========================================================================

    /// Connect to the backing store.
    ///
    /// Idempotent. Fails with [`DbError::Connection`] if the store is
    /// unreachable or malformed.
    pub fn connect(&self) -> Result<(), DbError> {
        if self.is_connected() {
            return Ok(());
        }
        self.inner.backend.open()?;
        self.inner.connected.store(true, Ordering::SeqCst);
        debug!(backend = ?self.inner.backend, "connected");
        Ok(())
    }

    /// Disconnect. Safe to call when already disconnected.
    pub fn disconnect(&self) {
        if self.inner.connected.swap(false, Ordering::SeqCst) {
            self.inner.backend.close();
            lock_ignoring_poison(&self.inner.creating).clear();
            debug!(backend = ?self.inner.backend, "disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// All scans currently in the store, sorted by id.
    pub fn get_scans(&self) -> Result<Vec<Scan>, DbError> {
        Ok(self
            .list_children(None)?
            .into_iter()
            .map(|id| Scan::new(self.clone(), Location::scan(id)))
            .collect())
    }

    /// Look up a scan, creating it when absent and `create` is set.
    ///
    /// Returns `Ok(None)` when absent and `create` is false.
    pub fn get_scan(&self, id: &str, create: bool) -> Result<Option<Scan>, DbError> {
        let loc = Location::scan(EntityId::new(id)?);
        Ok(self
            .get_or_create(loc, create)?
            .map(|loc| Scan::new(self.clone(), loc)))
    }

    /// Look up a scan, creating it when absent.
    pub fn ensure_scan(&self, id: &str) -> Result<Scan, DbError> {
        let loc = Location::scan(EntityId::new(id)?);
        self.get_or_create(loc.clone(), true)?;
        Ok(Scan::new(self.clone(), loc))
    }

    /// Create a new, empty scan. Fails with `AlreadyExists` if taken.
    pub fn create_scan(&self, id: &str) -> Result<Scan, DbError> {
        let loc = Location::scan(EntityId::new(id)?);
        self.create_entity(&loc)?;
        Ok(Scan::new(self.clone(), loc))
    }

    /// Delete a scan with all of its filesets, files and metadata.
    pub fn delete_scan(&self, id: &str) -> Result<(), DbError> {
        let loc = Location::scan(EntityId::new(id)?);
        self.delete_entity(&loc)
    }

    // =========================================================================
    // Shared machinery for entity handles
    // =========================================================================

    pub(crate) fn backend(&self) -> Result<&dyn Backend, DbError> {
        if self.is_connected() {
            Ok(self.inner.backend.as_ref())
        } else {
            Err(DbError::NotConnected)
        }
    }

    /// Run a mutation under the connection's write gate and the store lock.
    pub(crate) fn write<T>(
        &self,
        op: impl FnOnce(&dyn Backend) -> Result<T, DbError>,
    ) -> Result<T, DbError> {
        let backend = self.backend()?;
        let _gate = lock_ignoring_poison(&self.inner.write_gate);
        let _guard = backend.lock().inspect_err(|e| {
            if e.is_busy() {
                warn!("store is locked by another writer");
            }
        })?;
        debug!("acquired store lock");
        op(backend)
    }

    pub(crate) fn list_children(&self, parent: Option<&Location>) -> Result<Vec<EntityId>, DbError> {
        self.backend()?.list(parent)
    }

    pub(crate) fn create_entity(&self, loc: &Location) -> Result<(), DbError> {
        self.write(|backend| backend.create(loc))
    }

    pub(crate) fn delete_entity(&self, loc: &Location) -> Result<(), DbError> {
        self.write(|backend| backend.remove(loc))
    }

    /// Return `loc` if it exists; create it first when `create` is set.
    pub(crate) fn get_or_create(
        &self,
        loc: Location,
        create: bool,
    ) -> Result<Option<Location>, DbError> {
        let backend = self.backend()?;
        if backend.exists(&loc)? {
            return Ok(Some(loc));
        }
        if !create {
            return Ok(None);
        }

        let slot = {
            let mut creating = lock_ignoring_poison(&self.inner.creating);
            Arc::clone(creating.entry(loc.clone()).or_default())
        };

        let result = {
            let _creation = lock_ignoring_poison(&slot);
            match backend.exists(&loc) {
                Ok(true) => Ok(()),
                Ok(false) => match self.create_entity(&loc) {
                    // Another connection won the race; the entity is there
                    Err(DbError::AlreadyExists { .. }) => Ok(()),
                    other => other,
                },
                Err(e) => Err(e),
            }
        };

        {
            // Slots are cloned and dropped only under the registry lock
            let mut creating = lock_ignoring_poison(&self.inner.creating);
            drop(slot);
            if creating.get(&loc).is_some_and(|s| Arc::strong_count(s) == 1) {
                creating.remove(&loc);
            }
        }

        result.map(|()| Some(loc))
    }
}
