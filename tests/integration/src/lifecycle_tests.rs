//! End-to-end lifecycle tests across the storage crates
//!
//! Each test drives a repository the way the upload pipeline does: create the
//! root, stage bytes, commit into the inbox, then soft-delete, recover and
//! purge.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use lumilio_core::{DeleteMetadata, DirectoryManager, Error, RepositoryManager, StagingManager};
use lumilio_fs::RepoPath;
use lumilio_meta::{DuplicateHandling, RepositoryConfig, StorageStrategy};
use lumilio_test_utils::TestRepo;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const DAY: Duration = Duration::from_secs(86_400);

fn config(strategy: StorageStrategy, duplicates: DuplicateHandling) -> RepositoryConfig {
    RepositoryConfig::builder("Lifecycle")
        .storage_strategy(strategy)
        .duplicate_handling(duplicates)
        .build()
}

/// Stage `content` as `filename` and commit it into the inbox.
fn upload(
    manager: &RepositoryManager,
    root: &Path,
    filename: &str,
    content: &[u8],
    hash: Option<&str>,
) -> PathBuf {
    let staging = manager.staging_manager();
    let staged = staging.create_staging_file(root, filename).unwrap();
    staged.write_from(&mut &content[..]).unwrap();
    staging.commit_staging_file_to_inbox(&staged, hash).unwrap()
}

fn staged_count(root: &Path) -> usize {
    fs::read_dir(root.join(RepoPath::StagingIncoming.as_str()))
        .unwrap()
        .count()
}

#[test]
fn test_cas_upload_is_content_addressed_and_idempotent() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("archive");
    let mut manager = RepositoryManager::in_memory();
    manager
        .initialize_repository(&root, config(StorageStrategy::Cas, DuplicateHandling::Rename))
        .unwrap();

    let first = upload(&manager, &root, "vacation.jpg", b"sunset", Some("abcdef1234567890"));
    let second = upload(&manager, &root, "vacation.jpg", b"sunset", Some("abcdef1234567890"));

    let expected = PathBuf::from("inbox/ab/cd/ef/abcdef1234567890.jpg");
    assert_eq!(first, expected);
    assert_eq!(second, expected);
    assert_eq!(fs::read(root.join(&expected)).unwrap(), b"sunset");
    assert_eq!(staged_count(&root), 0);
}

#[test]
fn test_date_upload_lands_in_month_directory() {
    let temp = TempDir::new().unwrap();
    let mut manager = RepositoryManager::in_memory();
    manager
        .initialize_repository(
            temp.path(),
            config(StorageStrategy::Date, DuplicateHandling::Rename),
        )
        .unwrap();

    let first = upload(&manager, temp.path(), "IMG_0001.jpg", b"a", None);
    let second = upload(&manager, temp.path(), "IMG_0001.jpg", b"b", None);

    let month = chrono::Local::now().format("%Y/%m").to_string();
    assert_eq!(first, PathBuf::from(format!("inbox/{month}/IMG_0001.jpg")));
    assert_eq!(second, PathBuf::from(format!("inbox/{month}/IMG_0001 (1).jpg")));
    assert_eq!(fs::read(temp.path().join(&first)).unwrap(), b"a");
    assert_eq!(fs::read(temp.path().join(&second)).unwrap(), b"b");
}

#[test]
fn test_oversized_upload_stays_staged() {
    let temp = TempDir::new().unwrap();
    let mut manager = RepositoryManager::in_memory();
    let config = RepositoryConfig::builder("Small")
        .storage_strategy(StorageStrategy::Flat)
        .max_file_size(4)
        .build();
    manager.initialize_repository(temp.path(), config).unwrap();

    let staging = manager.staging_manager();
    let staged = staging.create_staging_file(temp.path(), "big.raw").unwrap();
    staged.write_from(&mut &b"0123456789"[..]).unwrap();

    let result = staging.commit_staging_file_to_inbox(&staged, None);

    assert!(matches!(result, Err(Error::FileTooLarge { size: 10, limit: 4, .. })));
    assert!(staged.path.is_file());
    assert!(!temp.path().join("inbox/big.raw").exists());
}

#[test]
fn test_trash_recover_purge_round() {
    let repo = TestRepo::new();
    let root = repo.root();
    let mut manager = RepositoryManager::in_memory();
    manager
        .initialize_repository(root, config(StorageStrategy::Flat, DuplicateHandling::Rename))
        .unwrap();
    let directories = manager.directory_manager();

    let kept = upload(&manager, root, "keep.jpg", b"keep", None);
    let old = upload(&manager, root, "old.jpg", b"old", None);

    let trashed = directories
        .move_to_trash(
            root,
            &root.join(&kept),
            Some(DeleteMetadata::default().with_reason("accidental").with_user_id("u-1")),
        )
        .unwrap();
    let stale = DeleteMetadata {
        deleted_at: Some(Utc::now() - chrono::Duration::days(40)),
        ..DeleteMetadata::default()
    };
    directories.move_to_trash(root, &old, Some(stale)).unwrap();

    repo.assert_file_not_exists("inbox/keep.jpg");
    assert_eq!(directories.list_trash_files(root).unwrap().len(), 2);

    let restored = directories.recover_from_trash(root, &trashed.id).unwrap();
    assert_eq!(restored, kept);
    repo.assert_file_contains("inbox/keep.jpg", "keep");

    let report = directories.purge_trash(root, 30 * DAY).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(report.bytes, 3);
    assert!(directories.list_trash_files(root).unwrap().is_empty());
    assert!(repo.list_dir(RepoPath::Trash.as_str()).is_empty());
    repo.assert_file_not_exists("inbox/old.jpg");
}

#[test]
fn test_nested_initialize_is_rejected_without_side_effects() {
    let temp = TempDir::new().unwrap();
    let mut manager = RepositoryManager::in_memory();
    manager
        .initialize_repository(
            temp.path(),
            config(StorageStrategy::Date, DuplicateHandling::Rename),
        )
        .unwrap();

    let nested = temp.path().join("inbox/2024/nested");
    let result = manager.initialize_repository(
        &nested,
        config(StorageStrategy::Date, DuplicateHandling::Rename),
    );

    assert!(matches!(result, Err(Error::NestedRepository { .. })));
    assert!(!nested.exists());
    assert_eq!(manager.list_repositories().len(), 1);
}

#[test]
fn test_registry_survives_config_roundtrip() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("library");
    let mut manager = RepositoryManager::in_memory();
    let created = manager
        .initialize_repository(&root, config(StorageStrategy::Date, DuplicateHandling::Uuid))
        .unwrap();

    let mut updated = manager.load_config(&root).unwrap();
    updated.storage_strategy = StorageStrategy::Flat;
    manager.update_repository(&created.id, updated).unwrap();

    let path = upload(&manager, &root, "scan.pdf", b"%PDF", None);
    assert_eq!(path, PathBuf::from("inbox/scan.pdf"));

    let mut fresh = RepositoryManager::in_memory();
    let adopted = fresh.add_repository(&root).unwrap();
    assert_eq!(adopted.id, created.id);
    assert_eq!(adopted.config.storage_strategy, StorageStrategy::Flat);
}

#[test]
fn test_concurrent_uploads_get_distinct_staging_files() {
    let temp = TempDir::new().unwrap();
    let mut manager = RepositoryManager::in_memory();
    manager
        .initialize_repository(
            temp.path(),
            config(StorageStrategy::Cas, DuplicateHandling::Rename),
        )
        .unwrap();
    let staging = manager.staging_manager();
    let root = temp.path();

    let staged: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                scope.spawn(move || {
                    let file = staging.create_staging_file(root, "same.jpg").unwrap();
                    file.write_from(&mut format!("payload {n}").as_bytes()).unwrap();
                    file
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let mut paths: Vec<_> = staged.iter().map(|file| file.path.clone()).collect();
    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 8);
    assert_eq!(staged_count(temp.path()), 8);

    let report = staging.cleanup_staging(temp.path(), DAY).unwrap();
    assert_eq!(report.removed, 0);
}
