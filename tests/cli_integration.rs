//! Integration tests for the `romidb` binary.
//!
//! Each test runs the binary against its own store with HOME and
//! XDG_CONFIG_HOME pointed at a temporary directory, so no user
//! configuration leaks in.

mod common;

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use common::TemporaryCloneDb;
use romidb::core::ops::StoreLock;
use romidb::core::paths::StorePaths;

/// Get a command for running romidb in an isolated environment.
fn romidb(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("romidb").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env_remove("ROMIDB_CONFIG")
        .env_remove("RUST_LOG");
    cmd
}

fn romidb_on(home: &Path, store: &Path) -> Command {
    let mut cmd = romidb(home);
    cmd.arg("--db").arg(store);
    cmd
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    romidb(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("romidb"));
}

#[test]
fn init_creates_a_store() {
    let home = TempDir::new().unwrap();
    let store = home.path().join("store");

    romidb(home.path())
        .args(["init"])
        .arg(&store)
        .args(["--description", "bench 4"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized store"));

    let config = fs::read_to_string(store.join("romidb.toml")).unwrap();
    assert!(config.contains("format_version = 1"));
    assert!(config.contains("bench 4"));

    // Re-running on an existing store is fine
    romidb(home.path()).arg("init").arg(&store).assert().success();
}

#[test]
fn missing_store_argument_fails() {
    let home = TempDir::new().unwrap();
    romidb(home.path())
        .arg("ls")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--db"));
}

#[test]
fn default_db_comes_from_user_config() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();
    let config_dir = home.path().join("romidb");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(
        config_dir.join("config.toml"),
        format!("default_db = {:?}\n", clone.path().display().to_string()),
    )
    .unwrap();

    romidb(home.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(predicate::str::contains(common::SCAN));
}

#[test]
fn ls_walks_the_hierarchy() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .arg("ls")
        .assert()
        .success()
        .stdout(format!("{}\n", common::SCAN));

    romidb_on(home.path(), clone.path())
        .args(["ls", common::SCAN])
        .assert()
        .success()
        .stdout(format!("{}\n", common::FILESET));

    romidb_on(home.path(), clone.path())
        .args(["ls", "testscan/testfileset"])
        .assert()
        .success()
        .stdout(predicate::str::contains("image\timage.png"))
        .stdout(predicate::str::contains("text\ttext.txt"));

    romidb_on(home.path(), clone.path())
        .args(["ls", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("scan not found: nope"));
}

#[test]
fn write_then_cat() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .args(["write", "s2/notes/readme", "plant 7 wilted", "--ext", "md"])
        .assert()
        .success();

    romidb_on(home.path(), clone.path())
        .args(["cat", "s2/notes/readme"])
        .assert()
        .success()
        .stdout("plant 7 wilted");

    assert!(clone.path().join("s2/notes/readme/payload/readme.md").is_file());
}

#[test]
fn cat_of_never_written_file_fails() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .args(["create", "testscan/testfileset/empty"])
        .assert()
        .success();

    romidb_on(home.path(), clone.path())
        .args(["cat", "testscan/testfileset/empty"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no content"));
}

#[test]
fn import_copies_source() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();
    let source = home.path().join("scan.ply");
    fs::write(&source, b"ply\nformat ascii 1.0\n").unwrap();

    romidb_on(home.path(), clone.path())
        .args(["import", "testscan/pointcloud/cloud"])
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("cloud.ply"));

    romidb_on(home.path(), clone.path())
        .args(["cat", "testscan/pointcloud/cloud"])
        .assert()
        .success()
        .stdout("ply\nformat ascii 1.0\n");
}

#[test]
fn meta_set_get_replace() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .args(["meta", "set", "testscan", "height", "12.5"])
        .assert()
        .success();

    romidb_on(home.path(), clone.path())
        .args(["meta", "get", "testscan", "height"])
        .assert()
        .success()
        .stdout("12.5\n");

    romidb_on(home.path(), clone.path())
        .args(["meta", "get", "testscan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"species\": \"arabidopsis\""));

    romidb_on(home.path(), clone.path())
        .args(["meta", "replace", "testscan", r#"{"only": true}"#])
        .assert()
        .success();

    romidb_on(home.path(), clone.path())
        .args(["meta", "get", "testscan", "species"])
        .assert()
        .failure();
}

#[test]
fn meta_rejects_bad_json() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .args(["meta", "set", "testscan", "k", "not json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));

    romidb_on(home.path(), clone.path())
        .args(["meta", "replace", "testscan", "[1, 2]"])
        .assert()
        .failure();
}

#[test]
fn rm_deletes_recursively() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .args(["rm", "testscan/testfileset"])
        .assert()
        .success();
    assert!(!clone.path().join("testscan/testfileset").exists());

    romidb_on(home.path(), clone.path())
        .args(["rm", "testscan/testfileset"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("fileset not found"));
}

#[test]
fn invalid_target_is_rejected() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .args(["create", "a/b/c/d"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid target"));
}

#[test]
fn busy_store_has_distinct_exit_status() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();
    let _lock = StoreLock::acquire(&StorePaths::new(clone.root())).unwrap();

    romidb_on(home.path(), clone.path())
        .args(["create", "another"])
        .assert()
        .code(75)
        .stderr(predicate::str::contains("busy"));

    // Reads still work
    romidb_on(home.path(), clone.path())
        .arg("ls")
        .assert()
        .success();
}

#[test]
fn quiet_suppresses_status_lines() {
    let home = TempDir::new().unwrap();
    let clone = TemporaryCloneDb::seeded();

    romidb_on(home.path(), clone.path())
        .args(["-q", "create", "quiet_scan"])
        .assert()
        .success()
        .stdout("");
}
