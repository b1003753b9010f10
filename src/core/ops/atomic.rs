//! core::ops::atomic
//!
//! Crash-safe file replacement.
//!
//! Content is written to a dot-prefixed temp file in the target directory,
//! fsynced, then renamed over the target. Readers see either the old or the
//! new content, never a partial write.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use crate::core::paths::StorePaths;

/// Atomically replace `path` with `contents`.
///
/// The parent directory must already exist. On failure the temp file is
/// removed and the target is left untouched.
pub fn write_atomic(path: &Path, contents: &[u8]) -> io::Result<()> {
    let temp_path = StorePaths::temp_path_for(path);

    let result: io::Result<()> = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&temp_path, path)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    result?;

    sync_parent(path);
    Ok(())
}

/// Copy `source` to `dest` with the same temp + rename guarantee.
pub fn copy_atomic(source: &Path, dest: &Path) -> io::Result<u64> {
    let temp_path = StorePaths::temp_path_for(dest);

    let result: io::Result<u64> = (|| {
        let copied = fs::copy(source, &temp_path)?;
        fs::File::open(&temp_path)?.sync_all()?;
        fs::rename(&temp_path, dest)?;
        Ok(copied)
    })();

    if result.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    let copied = result?;

    sync_parent(dest);
    Ok(copied)
}

/// Best-effort fsync of the directory holding `path`, so the rename itself
/// is durable. Not supported on every platform.
fn sync_parent(path: &Path) {
    #[cfg(unix)]
    if let Some(parent) = path.parent() {
        if let Ok(dir) = fs::File::open(parent) {
            let _ = dir.sync_all();
        }
    }
    #[cfg(not(unix))]
    let _ = path;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn write_creates_and_replaces() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("doc.json");

        write_atomic(&path, b"one").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"one");

        write_atomic(&path, b"two").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"two");

        assert_eq!(entries(temp.path()), vec!["doc.json"]);
    }

    #[test]
    fn write_into_missing_dir_fails_cleanly() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing").join("doc.json");

        assert!(write_atomic(&path, b"x").is_err());
        assert!(entries(temp.path()).is_empty());
    }

    #[test]
    fn copy_replaces_target() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.bin");
        let dst = temp.path().join("dst.bin");
        fs::write(&src, [1u8, 2, 3]).unwrap();
        fs::write(&dst, b"old").unwrap();

        assert_eq!(copy_atomic(&src, &dst).unwrap(), 3);
        assert_eq!(fs::read(&dst).unwrap(), vec![1u8, 2, 3]);
        assert_eq!(entries(temp.path()), vec!["dst.bin", "src.bin"]);
    }

    #[test]
    fn copy_missing_source_fails() {
        let temp = TempDir::new().unwrap();
        let result = copy_atomic(&temp.path().join("nope"), &temp.path().join("dst"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
        assert!(entries(temp.path()).is_empty());
    }

    #[test]
    fn copy_into_missing_dir_leaves_source_alone() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("src.bin");
        fs::write(&src, b"payload").unwrap();

        let err = copy_atomic(&src, &temp.path().join("missing").join("dst.bin")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert_eq!(fs::read(&src).unwrap(), b"payload");
        assert_eq!(entries(temp.path()), vec!["src.bin"]);
    }
}
