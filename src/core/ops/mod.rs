//! core::ops
//!
//! Store-wide write locking and atomic file replacement.
//!
//! # Modules
//!
//! - [`lock`] - Exclusive store lock
//! - [`atomic`] - Write-to-temp + fsync + rename helpers
//!
//! # Architecture
//!
//! Every mutating operation:
//! 1. Acquires the exclusive store lock (fails fast with busy if held)
//! 2. Performs its writes as write-to-temp + fsync + rename
//! 3. Releases the lock on drop

pub mod atomic;
pub mod lock;

pub use atomic::{copy_atomic, write_atomic};
pub use lock::{LockError, StoreLock};
