//! [`TestRepo`] builder for repository storage scenarios.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use lumilio_fs::layout::{LOG_PLACEHOLDERS, REQUIRED_DIRECTORIES};
use lumilio_meta::{DuplicateHandling, RepositoryConfig, StorageStrategy};
use tempfile::TempDir;

/// A temporary directory with helpers for laying out repository roots.
///
/// # Example
///
/// ```rust,no_run
/// use lumilio_meta::{DuplicateHandling, StorageStrategy};
/// use lumilio_test_utils::TestRepo;
///
/// let repo = TestRepo::new();
/// repo.init(StorageStrategy::Cas, DuplicateHandling::Rename);
/// repo.assert_file_exists(".lumiliorepo");
/// ```
pub struct TestRepo {
    temp_dir: TempDir,
}

impl Default for TestRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl TestRepo {
    /// Create an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    /// Return the root path of the temporary directory.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute path of `relative` under the root.
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Lay out every required directory and log placeholder by hand,
    /// without going through the code under test.
    pub fn create_layout(&self) {
        for dir in REQUIRED_DIRECTORIES {
            fs::create_dir_all(self.path(dir)).unwrap();
        }
        for (relative, header) in LOG_PLACEHOLDERS {
            fs::write(self.path(relative), header).unwrap();
        }
    }

    /// Lay out the directories and write a config with the given policy.
    pub fn init(
        &self,
        strategy: StorageStrategy,
        duplicates: DuplicateHandling,
    ) -> RepositoryConfig {
        let config = RepositoryConfig::builder("test repository")
            .storage_strategy(strategy)
            .duplicate_handling(duplicates)
            .build();
        self.init_with(&config);
        config
    }

    /// Lay out the directories and write `config`.
    pub fn init_with(&self, config: &RepositoryConfig) {
        self.create_layout();
        config.save(self.root()).unwrap();
    }

    /// Write `content` at `relative`, creating parents.
    pub fn write_file(&self, relative: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read_file(&self, relative: &str) -> Vec<u8> {
        let path = self.path(relative);
        fs::read(&path).unwrap_or_else(|_| panic!("Could not read file: {}", path.display()))
    }

    /// Push the mtime of `path` back by `age`.
    pub fn backdate(path: &Path, age: Duration) {
        let when = SystemTime::now() - age;
        fs::File::options()
            .write(true)
            .open(path)
            .and_then(|file| file.set_modified(when))
            .unwrap_or_else(|e| panic!("Could not backdate {}: {e}", path.display()));
    }

    /// Names of the direct children of `relative`, sorted.
    pub fn list_dir(&self, relative: &str) -> Vec<String> {
        let mut names: Vec<String> = match fs::read_dir(self.path(relative)) {
            Ok(entries) => entries
                .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    /// Assert that `path` (relative to the repo root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that `path` (relative to the repo root) does **not** exist.
    pub fn assert_file_not_exists(&self, path: &str) {
        let full_path = self.path(path);
        assert!(
            !full_path.exists(),
            "Expected file NOT to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `path` (relative to root) contains `content`.
    pub fn assert_file_contains(&self, path: &str, content: &str) {
        let full_path = self.path(path);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
