//! core::ops::lock
//!
//! Exclusive store lock for mutating operations.
//!
//! # Architecture
//!
//! The store lock ensures only one writer mutates a store at a time, across
//! threads, connections and processes. It is an OS-level advisory lock on
//! `<root>/lock`, so every connection against the same root sees it.
//!
//! # Invariants
//!
//! - Lock must be held for the entire mutation
//! - Lock is automatically released on drop (RAII pattern)
//! - Lock acquisition is non-blocking (fails fast if locked)
//! - The lock file itself is never removed; only the OS lock on it matters
//!
//! # Example
//!
//! ```ignore
//! use romidb::core::ops::lock::StoreLock;
//! use romidb::core::paths::StorePaths;
//!
//! let paths = StorePaths::new("/data/db".into());
//! let lock = StoreLock::acquire(&paths)?;
//!
//! // Mutate the store while holding the lock
//! // ...
//!
//! drop(lock);
//! ```

use std::fs::{File, OpenOptions};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::StorePaths;

/// Errors from locking operations.
#[derive(Debug, Error)]
pub enum LockError {
    /// Another connection or process already holds the lock.
    #[error("store is locked by another writer")]
    AlreadyLocked,

    /// Failed to create or open the lock file.
    #[error("failed to create lock: {0}")]
    CreateFailed(String),

    /// Failed to acquire the OS lock.
    #[error("failed to acquire lock: {0}")]
    AcquireFailed(String),
}

/// An exclusive lock on a store.
///
/// Released when dropped, even if the holder panics.
#[derive(Debug)]
pub struct StoreLock {
    /// Open handle carrying the OS lock.
    file: File,
}

impl StoreLock {
    /// Attempt to acquire the store lock.
    ///
    /// This is non-blocking: if another handle holds the lock, this returns
    /// [`LockError::AlreadyLocked`] immediately. Locks are tied to the open
    /// file handle, so two connections in the same process contend exactly
    /// like two processes do.
    ///
    /// # Errors
    ///
    /// - [`LockError::AlreadyLocked`] if another handle holds the lock
    /// - [`LockError::CreateFailed`] if the lock file cannot be opened
    /// - [`LockError::AcquireFailed`] if the OS lock cannot be acquired
    pub fn acquire(paths: &StorePaths) -> Result<Self, LockError> {
        let path = paths.lock_path();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                LockError::CreateFailed(format!("cannot open {}: {}", path.display(), e))
            })?;

        match file.try_lock_exclusive() {
            Ok(()) => Ok(Self { file }),
            Err(e) if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() => {
                Err(LockError::AlreadyLocked)
            }
            Err(e) => Err(LockError::AcquireFailed(e.to_string())),
        }
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        // Best-effort: closing the handle releases the OS lock anyway
        let _ = self.file.unlock();
    }
}
