//! db::memory
//!
//! In-memory backend for deterministic testing.
//!
//! # Design
//!
//! Clones of a [`MemoryBackend`] share the same storage and the same lock,
//! so two `Database`s built from clones behave like two connections to one
//! store. The store can be marked unreachable to exercise connection
//! failures.
//!
//! # Example
//!
//! ```
//! use romidb::db::{Database, MemoryBackend};
//!
//! let store = MemoryBackend::new();
//! let writer = Database::new(store.clone());
//! let reader = Database::new(store);
//! writer.connect().unwrap();
//! reader.connect().unwrap();
//!
//! writer.create_scan("scan1").unwrap();
//! assert!(reader.get_scan("scan1", false).unwrap().is_some());
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::core::metadata::{FileRecord, Metadata, PayloadKind};
use crate::core::types::{EntityId, Location};

use super::backend::{Backend, WriteGuard};
use super::error::DbError;

/// In-memory store shared across clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    nodes: Mutex<BTreeMap<Location, Node>>,
    locked: Arc<AtomicBool>,
    unreachable: AtomicBool,
}

#[derive(Debug, Default, Clone)]
struct Node {
    metadata: Metadata,
    payload: Option<(FileRecord, Vec<u8>)>,
}

/// Lock held on a memory store.
#[derive(Debug)]
pub struct MemoryGuard {
    locked: Arc<AtomicBool>,
}

impl WriteGuard for MemoryGuard {}

impl Drop for MemoryGuard {
    fn drop(&mut self) {
        self.locked.store(false, Ordering::Release);
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail with a connection error (or succeed again).
    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of entities at every level.
    pub fn entity_count(&self) -> usize {
        self.nodes().len()
    }

    fn nodes(&self) -> MutexGuard<'_, BTreeMap<Location, Node>> {
        self.inner
            .nodes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn is_descendant_or_self(candidate: &Location, ancestor: &Location) -> bool {
        let ancestor = ancestor.components();
        let candidate = candidate.components();
        candidate.len() >= ancestor.len() && candidate[..ancestor.len()] == ancestor[..]
    }
}

impl Backend for MemoryBackend {
    fn open(&self) -> Result<(), DbError> {
        if self.inner.unreachable.load(Ordering::SeqCst) {
            return Err(DbError::Connection("memory store is unreachable".into()));
        }
        Ok(())
    }

    fn lock(&self) -> Result<Box<dyn WriteGuard>, DbError> {
        self.inner
            .locked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| DbError::Busy)?;
        Ok(Box::new(MemoryGuard {
            locked: Arc::clone(&self.inner.locked),
        }))
    }

    fn list(&self, parent: Option<&Location>) -> Result<Vec<EntityId>, DbError> {
        let nodes = self.nodes();
        if let Some(parent) = parent {
            if !nodes.contains_key(parent) {
                return Err(DbError::not_found(parent));
            }
        }

        let mut ids: Vec<EntityId> = nodes
            .keys()
            .filter(|loc| loc.parent().as_ref() == parent)
            .map(|loc| loc.id().clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn exists(&self, loc: &Location) -> Result<bool, DbError> {
        Ok(self.nodes().contains_key(loc))
    }

    fn create(&self, loc: &Location) -> Result<(), DbError> {
        let mut nodes = self.nodes();
        if let Some(parent) = loc.parent() {
            if !nodes.contains_key(&parent) {
                return Err(DbError::not_found(&parent));
            }
        }
        if nodes.contains_key(loc) {
            return Err(DbError::already_exists(loc));
        }
        nodes.insert(loc.clone(), Node::default());
        Ok(())
    }

    fn remove(&self, loc: &Location) -> Result<(), DbError> {
        let mut nodes = self.nodes();
        if !nodes.contains_key(loc) {
            return Err(DbError::not_found(loc));
        }
        nodes.retain(|candidate, _| !Self::is_descendant_or_self(candidate, loc));
        Ok(())
    }

    fn read_metadata(&self, loc: &Location) -> Result<Metadata, DbError> {
        self.nodes()
            .get(loc)
            .map(|node| node.metadata.clone())
            .ok_or_else(|| DbError::not_found(loc))
    }

    fn write_metadata(&self, loc: &Location, metadata: &Metadata) -> Result<(), DbError> {
        let mut nodes = self.nodes();
        let node = nodes.get_mut(loc).ok_or_else(|| DbError::not_found(loc))?;
        node.metadata = metadata.clone();
        Ok(())
    }

    fn file_record(&self, loc: &Location) -> Result<Option<FileRecord>, DbError> {
        self.nodes()
            .get(loc)
            .map(|node| node.payload.as_ref().map(|(record, _)| record.clone()))
            .ok_or_else(|| DbError::not_found(loc))
    }

    fn read_payload(&self, loc: &Location) -> Result<Option<(FileRecord, Vec<u8>)>, DbError> {
        self.nodes()
            .get(loc)
            .map(|node| node.payload.clone())
            .ok_or_else(|| DbError::not_found(loc))
    }

    fn write_payload(
        &self,
        loc: &Location,
        filename: &str,
        kind: PayloadKind,
        data: &[u8],
    ) -> Result<FileRecord, DbError> {
        let mut nodes = self.nodes();
        let node = nodes.get_mut(loc).ok_or_else(|| DbError::not_found(loc))?;
        let record = FileRecord::new(filename, kind, data.len() as u64);
        node.payload = Some((record.clone(), data.to_vec()));
        Ok(record)
    }
}
