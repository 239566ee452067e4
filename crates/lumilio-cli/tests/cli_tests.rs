//! End-to-end tests that invoke the compiled `lumilio-repo` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a Command for the lumilio-repo binary
fn lumilio_cmd() -> Command {
    Command::cargo_bin("lumilio-repo").expect("Failed to find lumilio-repo binary")
}

fn init_repo(root: &std::path::Path, strategy: &str) {
    lumilio_cmd()
        .args(["init", "--strategy", strategy])
        .arg(root)
        .assert()
        .success();
}

/// Trash ids as printed by `trash list --json`.
fn trash_ids(root: &std::path::Path) -> Vec<String> {
    let output = lumilio_cmd()
        .args(["trash", "list", "--json"])
        .arg(root)
        .output()
        .unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    entries
        .as_array()
        .unwrap()
        .iter()
        .map(|entry| entry["id"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Basics
// ============================================================================

#[test]
fn test_help_lists_commands() {
    lumilio_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("trash"));
}

#[test]
fn test_unknown_strategy_is_rejected() {
    let temp = TempDir::new().unwrap();
    lumilio_cmd()
        .args(["init", "--strategy", "tree"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("tree"));
}

// ============================================================================
// init / validate / repair
// ============================================================================

#[test]
fn test_init_then_validate() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("photos");

    lumilio_cmd()
        .args(["init", "--name", "Family"])
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Repository initialized"));

    assert!(root.join(".lumiliorepo").is_file());
    lumilio_cmd()
        .arg("validate")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("Repository is valid"));
}

#[test]
fn test_validate_json_reports_missing_config() {
    let temp = TempDir::new().unwrap();

    let output = lumilio_cmd()
        .args(["validate", "--json"])
        .arg(temp.path())
        .output()
        .unwrap();

    assert!(!output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["valid"], false);
    assert!(result["errors"][0].as_str().unwrap().contains(".lumiliorepo"));
}

#[test]
fn test_init_nested_fails_and_leaves_no_tree() {
    let temp = TempDir::new().unwrap();
    init_repo(temp.path(), "date");
    let inner = temp.path().join("inner");

    lumilio_cmd()
        .arg("init")
        .arg(&inner)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nested"));

    assert!(!inner.exists());
}

#[test]
fn test_repair_recreates_directories() {
    let temp = TempDir::new().unwrap();
    init_repo(temp.path(), "date");
    fs::remove_dir_all(temp.path().join(".lumilio/assets")).unwrap();

    lumilio_cmd()
        .arg("repair")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(".lumilio/assets/thumbnails/small"));

    assert!(temp.path().join(".lumilio/assets/videos/web").is_dir());
}

// ============================================================================
// ingest / resolve
// ============================================================================

#[test]
fn test_ingest_with_cas_hash() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("repo");
    init_repo(&root, "cas");
    let source = temp.path().join("vacation.jpg");
    fs::write(&source, b"jpeg bytes").unwrap();

    lumilio_cmd()
        .arg("ingest")
        .arg(&root)
        .arg(&source)
        .args(["--hash", "abcdef1234567890"])
        .assert()
        .success()
        .stdout(predicate::str::contains("inbox/ab/cd/ef/abcdef1234567890.jpg"));

    let stored = root.join("inbox/ab/cd/ef/abcdef1234567890.jpg");
    assert_eq!(fs::read(stored).unwrap(), b"jpeg bytes");
    assert!(source.exists());
}

#[test]
fn test_resolve_flat_does_not_write() {
    let temp = TempDir::new().unwrap();
    init_repo(temp.path(), "flat");

    lumilio_cmd()
        .arg("resolve")
        .arg(temp.path())
        .arg("notes.txt")
        .assert()
        .success()
        .stdout(predicate::str::contains("inbox/notes.txt"));

    assert!(!temp.path().join("inbox/notes.txt").exists());
}

#[test]
fn test_resolve_outside_repository_fails() {
    let temp = TempDir::new().unwrap();

    lumilio_cmd()
        .arg("resolve")
        .arg(temp.path())
        .arg("a.jpg")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

// ============================================================================
// cleanup / trash
// ============================================================================

#[test]
fn test_cleanup_on_fresh_repository() {
    let temp = TempDir::new().unwrap();
    init_repo(temp.path(), "date");

    lumilio_cmd()
        .arg("cleanup")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Staging: 0 removed"));
}

#[test]
fn test_trash_move_list_recover() {
    let temp = TempDir::new().unwrap();
    init_repo(temp.path(), "flat");
    fs::write(temp.path().join("inbox/cat.png"), b"meow").unwrap();

    lumilio_cmd()
        .args(["trash", "move"])
        .arg(temp.path())
        .arg("inbox/cat.png")
        .args(["--reason", "duplicate"])
        .assert()
        .success();
    assert!(!temp.path().join("inbox/cat.png").exists());

    let ids = trash_ids(temp.path());
    assert_eq!(ids.len(), 1);

    lumilio_cmd()
        .args(["trash", "list"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("inbox/cat.png"))
        .stdout(predicate::str::contains("duplicate"));

    lumilio_cmd()
        .args(["trash", "recover"])
        .arg(temp.path())
        .arg(&ids[0])
        .assert()
        .success();

    assert_eq!(fs::read(temp.path().join("inbox/cat.png")).unwrap(), b"meow");
    assert!(trash_ids(temp.path()).is_empty());
}

#[test]
fn test_trash_move_rejects_config_file() {
    let temp = TempDir::new().unwrap();
    init_repo(temp.path(), "date");

    lumilio_cmd()
        .args(["trash", "move"])
        .arg(temp.path())
        .arg(".lumiliorepo")
        .assert()
        .failure();

    assert!(temp.path().join(".lumiliorepo").is_file());
}

#[test]
fn test_trash_purge_keeps_fresh_entries() {
    let temp = TempDir::new().unwrap();
    init_repo(temp.path(), "flat");
    fs::write(temp.path().join("inbox/a.txt"), b"a").unwrap();
    lumilio_cmd()
        .args(["trash", "move"])
        .arg(temp.path())
        .arg("inbox/a.txt")
        .assert()
        .success();

    lumilio_cmd()
        .args(["trash", "purge", "--older-than", "1h"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Purged 0 entries"));

    assert_eq!(trash_ids(temp.path()).len(), 1);
}
