//! Physical directory lifecycle for repository roots
//!
//! The [`DirectoryManager`] trait owns everything that touches the
//! `.lumilio` system tree: creating and repairing the layout, the
//! permission policy, staging and temp primitives, and the trash.
//! [`DefaultDirectoryManager`] is stateless; every call resolves the
//! root it is given.

mod default;
mod sweep;
mod trash;

pub use default::DefaultDirectoryManager;
pub(crate) use default::{FALLBACK_FILENAME, check_access};

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lumilio_fs::RepositoryLayout;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Outcome of [`DirectoryManager::validate_structure`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureValidation {
    /// No invalid paths and no permission issues
    pub valid: bool,
    /// Required directories that are absent; repairable
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_directories: Vec<String>,
    /// Type collisions and root problems; never auto-repaired
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub invalid_paths: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permission_issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// An upload in progress under `.lumilio/staging/incoming`.
///
/// Owned by exactly one upload until it is committed or swept by age.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingFile {
    pub id: String,
    /// Absolute repository root the file belongs to
    pub repo_root: PathBuf,
    /// Absolute location of the staged bytes
    pub path: PathBuf,
    /// Sanitized original filename
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

impl StagingFile {
    /// Copy `reader` into the staged file, replacing any previous content.
    ///
    /// Returns the number of bytes written.
    pub fn write_from<R: Read>(&self, reader: &mut R) -> Result<u64> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        let written = io::copy(reader, &mut file).map_err(|e| Error::io(&self.path, e))?;
        file.flush()
            .and_then(|()| file.sync_all())
            .map_err(|e| Error::io(&self.path, e))?;
        Ok(written)
    }

    /// Current size of the staged bytes.
    pub fn size(&self) -> Result<u64> {
        File::open(&self.path)
            .and_then(|f| f.metadata())
            .map(|m| m.len())
            .map_err(|e| Error::io(&self.path, e))
    }
}

/// Scratch file under `.lumilio/temp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempFile {
    pub id: String,
    pub repo_root: PathBuf,
    pub path: PathBuf,
    /// Short tag, e.g. `thumbnail`
    pub purpose: String,
    pub created_at: DateTime<Utc>,
}

/// The JSON sidecar written next to trashed content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeleteMetadata {
    /// Filled with the current time when absent
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Root-relative location to restore to; filled from the source when empty
    #[serde(default)]
    pub original_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Map<String, serde_json::Value>>,
}

impl DeleteMetadata {
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn with_asset_id(mut self, asset_id: impl Into<String>) -> Self {
        self.asset_id = Some(asset_id.into());
        self
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// A soft-deleted entry in `.lumilio/trash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrashFile {
    pub id: String,
    pub repo_root: PathBuf,
    pub trash_path: PathBuf,
    /// Parsed sidecar, when one exists and parses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<DeleteMetadata>,
}

/// What an age-based sweep removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub removed: usize,
    pub bytes: u64,
}

impl CleanupReport {
    pub fn merge(&mut self, other: CleanupReport) {
        self.removed += other.removed;
        self.bytes += other.bytes;
    }
}

/// Physical directory structure and system area management.
pub trait DirectoryManager: Send + Sync {
    /// Create every required directory and seed the log placeholders.
    ///
    /// Idempotent. Existing logs are never truncated.
    fn create_structure(&self, root: &Path) -> Result<()>;

    /// Inspect the layout without repairing it.
    ///
    /// The only write is a throwaway access-check file, removed right away.
    fn validate_structure(&self, root: &Path) -> Result<StructureValidation>;

    /// Recreate missing directories and log placeholders, then reapply
    /// permissions.
    ///
    /// Refuses with [`Error::Structure`] when a required location has the
    /// wrong type. Never deletes or overwrites existing content.
    fn repair_structure(&self, root: &Path) -> Result<()>;

    /// Apply the permission policy to the system directories. No-op off Unix.
    fn protect_system_directories(&self, root: &Path) -> Result<()>;

    /// Whether `path` falls inside `.lumilio` or `inbox`.
    ///
    /// Relative paths are taken as root-relative. An unresolvable root is
    /// treated as protected.
    fn is_protected_path(&self, root: &Path, path: &Path) -> bool;

    /// Reapply the permission policy.
    fn enforce_permissions(&self, root: &Path) -> Result<()> {
        self.protect_system_directories(root)
    }

    /// Reserve an empty staging file for one upload.
    fn create_staging_file(&self, root: &Path, filename: &str) -> Result<StagingFile>;

    /// Move a staged file to a root-relative destination with a single rename.
    fn commit_staging_file(&self, staging: &StagingFile, final_relative: &Path) -> Result<()>;

    /// Remove staged and failed uploads older than `max_age`.
    fn cleanup_staging(&self, root: &Path, max_age: Duration) -> Result<CleanupReport>;

    fn create_temp_file(&self, root: &Path, purpose: &str) -> Result<TempFile>;

    /// Remove temp entries older than `max_age`.
    fn cleanup_temp_files(&self, root: &Path, max_age: Duration) -> Result<CleanupReport>;

    /// Soft-delete a file inside the root.
    ///
    /// Content move and sidecar write are two steps; a sidecar failure is
    /// reported after the content has already moved.
    fn move_to_trash(
        &self,
        root: &Path,
        path: &Path,
        metadata: Option<DeleteMetadata>,
    ) -> Result<TrashFile>;

    /// Trashed entries. A missing trash directory yields an empty list.
    fn list_trash_files(&self, root: &Path) -> Result<Vec<TrashFile>>;

    /// Restore a trashed entry to its original location.
    ///
    /// Returns the restored root-relative path.
    fn recover_from_trash(&self, root: &Path, trash_id: &str) -> Result<PathBuf>;

    /// Permanently delete trash entries deleted before `now - older_than`.
    fn purge_trash(&self, root: &Path, older_than: Duration) -> Result<CleanupReport>;
}

/// Resolve a caller-supplied root, surfacing failures as path errors.
pub(crate) fn resolve_root(root: &Path) -> Result<RepositoryLayout> {
    RepositoryLayout::resolve(root).map_err(|e| match e {
        lumilio_fs::Error::UnresolvablePath { path, reason } => Error::path(path, reason),
        other => other.into(),
    })
}
