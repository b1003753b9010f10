//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`EntityId`] - Validated identifier of a scan, fileset or file
//! - [`EntityKind`] - Which level of the hierarchy an entity lives on
//! - [`Location`] - Full address of an entity (scan, fileset, file chain)
//!
//! # Validation
//!
//! Identifiers are validated at construction time. An invalid id cannot be
//! represented, so every `EntityId` maps to exactly one persisted location.
//!
//! # Examples
//!
//! ```
//! use romidb::core::types::EntityId;
//!
//! let id = EntityId::new("plant-042").unwrap();
//! assert_eq!(id.as_str(), "plant-042");
//!
//! assert!(EntityId::new("a/b").is_err());
//! assert!(EntityId::new(".hidden").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Names used by the filesystem layout that ids may not take.
pub const RESERVED_NAMES: [&str; 4] = ["metadata.json", "file.json", "romidb.toml", "lock"];

/// Maximum id length in bytes (a single path component on common filesystems).
pub const MAX_ID_LEN: usize = 255;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid id '{id}': {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("invalid payload filename '{name}': {reason}")]
    InvalidFilename { name: String, reason: &'static str },
}

/// A validated entity identifier.
///
/// Rules:
/// - Cannot be empty or longer than [`MAX_ID_LEN`] bytes
/// - Cannot start with `.` (temporaries live under dot-names)
/// - Cannot contain `/`, `\` or control characters
/// - Cannot be one of [`RESERVED_NAMES`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityId(String);

impl EntityId {
    /// Create a new validated id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidId` if the id breaks any of the rules above.
    pub fn new(id: impl Into<String>) -> Result<Self, TypeError> {
        let id = id.into();
        Self::validate(&id)?;
        Ok(Self(id))
    }

    fn validate(id: &str) -> Result<(), TypeError> {
        let reason = component_error(id)
            .or_else(|| RESERVED_NAMES.contains(&id).then_some("is a reserved name"));
        match reason {
            Some(reason) => Err(TypeError::InvalidId {
                id: id.to_string(),
                reason,
            }),
            None => Ok(()),
        }
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EntityId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for EntityId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EntityId> for String {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Validate a payload filename.
///
/// Payloads live in their own directory, so unlike ids a filename may equal
/// one of [`RESERVED_NAMES`]. It must still be a single visible path
/// component.
///
/// # Errors
///
/// Returns `TypeError::InvalidFilename` naming the broken rule.
pub fn validate_filename(name: &str) -> Result<(), TypeError> {
    match component_error(name) {
        Some(reason) => Err(TypeError::InvalidFilename {
            name: name.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// Rules shared by ids and filenames. Returns the first one `name` breaks.
fn component_error(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        Some("cannot be empty")
    } else if name.len() > MAX_ID_LEN {
        Some("is longer than 255 bytes")
    } else if name.starts_with('.') {
        Some("cannot start with '.'")
    } else if name.contains('/') || name.contains('\\') {
        Some("cannot contain path separators")
    } else if name.chars().any(|c| c.is_control()) {
        Some("cannot contain control characters")
    } else {
        None
    }
}

/// Level of the scan/fileset/file hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Scan,
    Fileset,
    File,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Scan => "scan",
            EntityKind::Fileset => "fileset",
            EntityKind::File => "file",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of an entity inside a store.
///
/// A location names the whole chain of ancestors, so it maps to exactly one
/// persisted place and doubles as the non-owning back-reference from a child
/// to its parents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Location {
    Scan {
        scan: EntityId,
    },
    Fileset {
        scan: EntityId,
        fileset: EntityId,
    },
    File {
        scan: EntityId,
        fileset: EntityId,
        file: EntityId,
    },
}

impl Location {
    /// Location of a scan.
    pub fn scan(scan: EntityId) -> Self {
        Location::Scan { scan }
    }

    /// Location of a child of `self`, or `None` for a file (files are leaves).
    pub fn child(&self, id: EntityId) -> Option<Self> {
        match self {
            Location::Scan { scan } => Some(Location::Fileset {
                scan: scan.clone(),
                fileset: id,
            }),
            Location::Fileset { scan, fileset } => Some(Location::File {
                scan: scan.clone(),
                fileset: fileset.clone(),
                file: id,
            }),
            Location::File { .. } => None,
        }
    }

    /// Location of the parent entity, or `None` for a scan.
    pub fn parent(&self) -> Option<Self> {
        match self {
            Location::Scan { .. } => None,
            Location::Fileset { scan, .. } => Some(Location::scan(scan.clone())),
            Location::File { scan, fileset, .. } => Some(Location::Fileset {
                scan: scan.clone(),
                fileset: fileset.clone(),
            }),
        }
    }

    /// The id of the addressed entity itself.
    pub fn id(&self) -> &EntityId {
        match self {
            Location::Scan { scan } => scan,
            Location::Fileset { fileset, .. } => fileset,
            Location::File { file, .. } => file,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Location::Scan { .. } => EntityKind::Scan,
            Location::Fileset { .. } => EntityKind::Fileset,
            Location::File { .. } => EntityKind::File,
        }
    }

    /// Kind of the entities this location contains, `None` for files.
    pub fn child_kind(&self) -> Option<EntityKind> {
        match self {
            Location::Scan { .. } => Some(EntityKind::Fileset),
            Location::Fileset { .. } => Some(EntityKind::File),
            Location::File { .. } => None,
        }
    }

    pub fn scan_id(&self) -> &EntityId {
        match self {
            Location::Scan { scan } | Location::Fileset { scan, .. } | Location::File { scan, .. } => {
                scan
            }
        }
    }

    /// Ids from the scan down to this entity.
    pub fn components(&self) -> Vec<&EntityId> {
        match self {
            Location::Scan { scan } => vec![scan],
            Location::Fileset { scan, fileset } => vec![scan, fileset],
            Location::File {
                scan,
                fileset,
                file,
            } => vec![scan, fileset, file],
        }
    }

    /// Parse a `scan[/fileset[/file]]` path.
    ///
    /// # Example
    ///
    /// ```
    /// use romidb::core::types::{EntityKind, Location};
    ///
    /// let loc = Location::parse("scan1/images/rgb_0001").unwrap();
    /// assert_eq!(loc.kind(), EntityKind::File);
    /// assert_eq!(loc.to_string(), "scan1/images/rgb_0001");
    /// ```
    pub fn parse(path: &str) -> Result<Self, TypeError> {
        let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
        match parts.as_slice() {
            [scan] => Ok(Location::scan(EntityId::new(*scan)?)),
            [scan, fileset] => Ok(Location::Fileset {
                scan: EntityId::new(*scan)?,
                fileset: EntityId::new(*fileset)?,
            }),
            [scan, fileset, file] => Ok(Location::File {
                scan: EntityId::new(*scan)?,
                fileset: EntityId::new(*fileset)?,
                file: EntityId::new(*file)?,
            }),
            _ => Err(TypeError::InvalidId {
                id: path.to_string(),
                reason: "expected scan[/fileset[/file]]",
            }),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.components().iter().map(|id| id.as_str()).collect();
        f.write_str(&parts.join("/"))
    }
}
