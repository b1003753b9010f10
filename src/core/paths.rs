//! core::paths
//!
//! Centralized path routing for filesystem store locations.
//!
//! # Architecture
//!
//! Every on-disk location of a store is computed here. No other module may
//! join entity ids onto the store root by hand; all paths go through
//! [`StorePaths`].
//!
//! # Storage Layout
//!
//! ```text
//! <root>/romidb.toml                          store marker and config
//! <root>/lock                                 advisory lock file
//! <root>/<scan>/metadata.json
//! <root>/<scan>/<fileset>/metadata.json
//! <root>/<scan>/<fileset>/<file>/metadata.json
//! <root>/<scan>/<fileset>/<file>/file.json    file record
//! <root>/<scan>/<fileset>/<file>/payload/<filename>
//! ```
//!
//! Names starting with `.` are temporaries and are never listed as entities.
//!
//! # Example
//!
//! ```
//! use romidb::core::paths::StorePaths;
//! use romidb::core::types::Location;
//! use std::path::PathBuf;
//!
//! let paths = StorePaths::new(PathBuf::from("/data/db"));
//! let loc = Location::parse("scan1/images").unwrap();
//!
//! assert_eq!(paths.entity_dir(&loc), PathBuf::from("/data/db/scan1/images"));
//! assert_eq!(
//!     paths.metadata_path(&loc),
//!     PathBuf::from("/data/db/scan1/images/metadata.json")
//! );
//! ```

use std::path::{Path, PathBuf};

use crate::core::types::Location;

/// File name of the store marker/config at the root.
pub const STORE_CONFIG_FILE: &str = "romidb.toml";

/// File name of the advisory lock at the root.
pub const LOCK_FILE: &str = "lock";

/// File name of an entity's metadata document.
pub const METADATA_FILE: &str = "metadata.json";

/// File name of a file entity's record.
pub const FILE_RECORD_FILE: &str = "file.json";

/// Directory under a file entity holding its payload.
pub const PAYLOAD_DIR: &str = "payload";

/// Centralized path routing for a filesystem store.
///
/// # Invariants
///
/// - Each `Location` maps to exactly one directory under `root`
/// - Temporaries are dot-prefixed siblings of their final path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    root: PathBuf,
}

impl StorePaths {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of the store.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // =========================================================================
    // Store-scoped paths
    // =========================================================================

    /// This is `<root>/romidb.toml`.
    pub fn store_config_path(&self) -> PathBuf {
        self.root.join(STORE_CONFIG_FILE)
    }

    /// This is `<root>/lock`.
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    // =========================================================================
    // Entity-scoped paths
    // =========================================================================

    /// Directory holding an entity and its children.
    pub fn entity_dir(&self, loc: &Location) -> PathBuf {
        let mut path = self.root.clone();
        for id in loc.components() {
            path.push(id.as_str());
        }
        path
    }

    /// Directory whose subdirectories are the children of `parent`
    /// (the store root for `None`).
    pub fn children_dir(&self, parent: Option<&Location>) -> PathBuf {
        match parent {
            Some(loc) => self.entity_dir(loc),
            None => self.root.clone(),
        }
    }

    /// This is `<entity_dir>/metadata.json`.
    pub fn metadata_path(&self, loc: &Location) -> PathBuf {
        self.entity_dir(loc).join(METADATA_FILE)
    }

    /// This is `<file_dir>/file.json`.
    pub fn file_record_path(&self, loc: &Location) -> PathBuf {
        self.entity_dir(loc).join(FILE_RECORD_FILE)
    }

    /// This is `<file_dir>/payload`. Kept apart from the entity documents so
    /// a payload named `metadata.json` cannot shadow them.
    pub fn payload_dir(&self, loc: &Location) -> PathBuf {
        self.entity_dir(loc).join(PAYLOAD_DIR)
    }

    /// Path of a file's payload stored under `filename`.
    pub fn payload_path(&self, loc: &Location, filename: &str) -> PathBuf {
        self.payload_dir(loc).join(filename)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Unique dot-prefixed sibling used for write-then-rename.
    pub fn temp_path_for(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        path.with_file_name(format!(".{}.{}.tmp", name, uuid::Uuid::new_v4().simple()))
    }

    /// Unique dot-prefixed sibling an entity directory is renamed to before
    /// it is removed.
    pub fn trash_path_for(&self, loc: &Location) -> PathBuf {
        let dir = self.entity_dir(loc);
        dir.with_file_name(format!(
            ".{}.deleted-{}",
            loc.id(),
            uuid::Uuid::new_v4().simple()
        ))
    }

    /// Whether a directory entry name is a temporary (never an entity).
    pub fn is_hidden(name: &str) -> bool {
        name.starts_with('.')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> StorePaths {
        StorePaths::new(PathBuf::from("/db"))
    }

    #[test]
    fn store_paths() {
        let p = paths();
        assert_eq!(p.store_config_path(), PathBuf::from("/db/romidb.toml"));
        assert_eq!(p.lock_path(), PathBuf::from("/db/lock"));
    }

    #[test]
    fn entity_paths() {
        let p = paths();
        let file = Location::parse("s/fs/f").unwrap();
        assert_eq!(p.entity_dir(&file), PathBuf::from("/db/s/fs/f"));
        assert_eq!(p.file_record_path(&file), PathBuf::from("/db/s/fs/f/file.json"));
        assert_eq!(p.payload_dir(&file), PathBuf::from("/db/s/fs/f/payload"));
        assert_eq!(
            p.payload_path(&file, "f.png"),
            PathBuf::from("/db/s/fs/f/payload/f.png")
        );
        assert_ne!(
            p.payload_path(&file, "metadata.json"),
            p.metadata_path(&file)
        );
    }

    #[test]
    fn children_dir_of_root_is_root() {
        let p = paths();
        assert_eq!(p.children_dir(None), PathBuf::from("/db"));
        let scan = Location::parse("s").unwrap();
        assert_eq!(p.children_dir(Some(&scan)), PathBuf::from("/db/s"));
    }

    #[test]
    fn temporaries_are_hidden_siblings() {
        let target = PathBuf::from("/db/s/metadata.json");
        let tmp = StorePaths::temp_path_for(&target);
        assert_eq!(tmp.parent(), target.parent());
        let name = tmp.file_name().unwrap().to_str().unwrap();
        assert!(StorePaths::is_hidden(name));
        assert_ne!(tmp, StorePaths::temp_path_for(&target));

        let trash = paths().trash_path_for(&Location::parse("s/fs").unwrap());
        assert_eq!(trash.parent(), Some(Path::new("/db/s")));
        assert!(StorePaths::is_hidden(
            trash.file_name().unwrap().to_str().unwrap()
        ));
    }
}
