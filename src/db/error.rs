//! db::error
//!
//! Error taxonomy of the database API.
//!
//! Lookups without `create` return `Option` and an absent metadata key is
//! `None`; everything else that goes wrong surfaces as a [`DbError`]. Nothing
//! is retried internally, so [`DbError::Busy`] reaches the caller as-is.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::ConfigError;
use crate::core::metadata::{MetadataError, StoreError};
use crate::core::ops::LockError;
use crate::core::types::{EntityKind, Location, TypeError};

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// Operation attempted before `connect` or after `disconnect`.
    #[error("database is not connected")]
    NotConnected,

    /// The backing store is unreachable or malformed.
    #[error("cannot connect to store: {0}")]
    Connection(String),

    /// Deleting or addressing an entity that does not exist.
    #[error("{kind} not found: {location}")]
    NotFound { kind: EntityKind, location: String },

    /// Creating an entity whose id is taken.
    #[error("{kind} already exists: {location}")]
    AlreadyExists { kind: EntityKind, location: String },

    /// Another connection or process holds the store lock. Retryable.
    #[error("database is busy: the store is locked by another writer")]
    Busy,

    /// Reading a file that was never written.
    #[error("file has no content: {0}")]
    EmptyFile(String),

    /// Reading text from content that is not valid UTF-8.
    #[error("file content of {location} is not valid UTF-8: {source}")]
    Encoding {
        location: String,
        source: std::string::FromUtf8Error,
    },

    /// The source of an import does not exist.
    #[error("import source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error(transparent)]
    InvalidId(#[from] TypeError),

    /// A persisted document is corrupt.
    #[error("metadata error: {0}")]
    Metadata(String),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
}

impl DbError {
    pub(crate) fn not_found(location: &Location) -> Self {
        DbError::NotFound {
            kind: location.kind(),
            location: location.to_string(),
        }
    }

    pub(crate) fn already_exists(location: &Location) -> Self {
        DbError::AlreadyExists {
            kind: location.kind(),
            location: location.to_string(),
        }
    }

    /// Whether the caller may retry the same operation later.
    pub fn is_busy(&self) -> bool {
        matches!(self, DbError::Busy)
    }
}

impl From<LockError> for DbError {
    fn from(e: LockError) -> Self {
        match e {
            LockError::AlreadyLocked => DbError::Busy,
            other => DbError::Io(io::Error::other(other.to_string())),
        }
    }
}

impl From<StoreError> for DbError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Io { source, .. } => DbError::Io(source),
            corrupt @ StoreError::Corrupt { .. } => DbError::Metadata(corrupt.to_string()),
        }
    }
}

impl From<MetadataError> for DbError {
    fn from(e: MetadataError) -> Self {
        DbError::Metadata(e.to_string())
    }
}

impl From<ConfigError> for DbError {
    fn from(e: ConfigError) -> Self {
        DbError::Connection(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_contention_is_busy() {
        let err: DbError = LockError::AlreadyLocked.into();
        assert!(err.is_busy());

        let err: DbError = LockError::AcquireFailed("x".into()).into();
        assert!(!err.is_busy());
    }

    #[test]
    fn not_found_names_kind_and_location() {
        let loc = Location::parse("s/fs").unwrap();
        let err = DbError::not_found(&loc);
        assert_eq!(err.to_string(), "fileset not found: s/fs");
    }

    #[test]
    fn already_exists_names_kind_and_location() {
        let loc = Location::parse("s").unwrap();
        let err = DbError::already_exists(&loc);
        assert_eq!(err.to_string(), "scan already exists: s");
    }

    #[test]
    fn config_errors_are_connection_errors() {
        let err: DbError = ConfigError::InvalidValue("bad".into()).into();
        assert!(matches!(err, DbError::Connection(_)));
    }
}
