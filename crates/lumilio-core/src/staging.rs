//! Configuration-driven placement of staged uploads
//!
//! [`StagingManager`] decides where a staged file lands inside `inbox`
//! according to the repository's `.lumiliorepo`, then hands the move to the
//! [`DirectoryManager`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Datelike, Local};
use lumilio_fs::{RepoPath, RepositoryLayout, sanitize_file_name};
use lumilio_meta::{DuplicateHandling, RepositoryConfig, StorageStrategy};
use uuid::Uuid;

use crate::directory::{
    CleanupReport, DefaultDirectoryManager, DirectoryManager, StagingFile, resolve_root,
};
use crate::{Error, Result};

/// Minimum hash length for content-addressed placement.
pub const CAS_MIN_HASH_LEN: usize = 6;

/// Highest `name (N).ext` tried before falling back to a timestamp.
const MAX_RENAME_ATTEMPTS: u32 = 999;

/// Staging operations with repository configuration support.
pub trait StagingManager: Send + Sync {
    fn create_staging_file(&self, root: &Path, filename: &str) -> Result<StagingFile>;

    fn commit_staging_file(&self, staging: &StagingFile, final_relative: &Path) -> Result<()>;

    /// Commit into the inbox at the location the repository config dictates.
    ///
    /// Returns the repository-relative destination. On any error the file
    /// stays staged.
    fn commit_staging_file_to_inbox(
        &self,
        staging: &StagingFile,
        content_hash: Option<&str>,
    ) -> Result<PathBuf>;

    fn cleanup_staging(&self, root: &Path, max_age: Duration) -> Result<CleanupReport>;

    /// Compute the inbox destination for `filename` without committing.
    fn resolve_inbox_path(
        &self,
        root: &Path,
        filename: &str,
        content_hash: Option<&str>,
    ) -> Result<PathBuf>;
}

/// [`StagingManager`] backed by a [`DirectoryManager`].
#[derive(Debug, Clone, Default)]
pub struct DefaultStagingManager<D: DirectoryManager = DefaultDirectoryManager> {
    directories: D,
}

impl DefaultStagingManager {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<D: DirectoryManager> DefaultStagingManager<D> {
    pub fn with_directory_manager(directories: D) -> Self {
        Self { directories }
    }

    pub fn directory_manager(&self) -> &D {
        &self.directories
    }
}

impl<D: DirectoryManager> StagingManager for DefaultStagingManager<D> {
    fn create_staging_file(&self, root: &Path, filename: &str) -> Result<StagingFile> {
        self.directories.create_staging_file(root, filename)
    }

    fn commit_staging_file(&self, staging: &StagingFile, final_relative: &Path) -> Result<()> {
        self.directories.commit_staging_file(staging, final_relative)
    }

    fn commit_staging_file_to_inbox(
        &self,
        staging: &StagingFile,
        content_hash: Option<&str>,
    ) -> Result<PathBuf> {
        let config = RepositoryConfig::load(&staging.repo_root)?;

        if let Some(limit) = config.max_file_size() {
            let size = staging.size()?;
            if size > limit {
                return Err(Error::FileTooLarge {
                    path: staging.path.clone(),
                    size,
                    limit,
                });
            }
        }

        let layout = resolve_root(&staging.repo_root)?;
        let destination = placement(
            &layout,
            &config,
            &staging.filename,
            content_hash,
            Local::now(),
        )?;
        self.directories.commit_staging_file(staging, &destination)?;

        tracing::info!(
            id = %staging.id,
            strategy = %config.storage_strategy,
            destination = %destination.display(),
            "Committed upload to inbox"
        );
        Ok(destination)
    }

    fn cleanup_staging(&self, root: &Path, max_age: Duration) -> Result<CleanupReport> {
        self.directories.cleanup_staging(root, max_age)
    }

    fn resolve_inbox_path(
        &self,
        root: &Path,
        filename: &str,
        content_hash: Option<&str>,
    ) -> Result<PathBuf> {
        let config = RepositoryConfig::load(root)?;
        let layout = resolve_root(root)?;
        let filename = sanitize_file_name(filename, crate::directory::FALLBACK_FILENAME);
        placement(&layout, &config, &filename, content_hash, Local::now())
    }
}

/// Root-relative destination for an upload.
///
/// Flat and date placements check the target directory for collisions.
/// Content-addressed placement never collides by construction.
fn placement(
    layout: &RepositoryLayout,
    config: &RepositoryConfig,
    filename: &str,
    content_hash: Option<&str>,
    now: DateTime<Local>,
) -> Result<PathBuf> {
    let inbox = PathBuf::from(RepoPath::Inbox.as_str());
    let duplicates = config.local_settings.handle_duplicate_filenames;

    let directory = match config.storage_strategy {
        StorageStrategy::Cas => match content_hash.map(str::trim) {
            Some(hash) if hash.len() >= CAS_MIN_HASH_LEN => {
                // Hash characters become path components.
                if !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
                    return Err(Error::path(hash, "content hash must be alphanumeric"));
                }
                let (_, extension) = split_extension(filename);
                return Ok(inbox
                    .join(&hash[0..2])
                    .join(&hash[2..4])
                    .join(&hash[4..6])
                    .join(format!("{hash}{extension}")));
            }
            hash => {
                tracing::debug!(?hash, "Hash too short for content addressing, using date layout");
                date_directory(&inbox, now)
            }
        },
        StorageStrategy::Date => date_directory(&inbox, now),
        StorageStrategy::Flat => inbox,
    };

    let absolute = layout.join(&directory.to_string_lossy()).to_native();
    let name = unique_filename(&absolute, filename, duplicates, now);
    Ok(directory.join(name))
}

fn date_directory(inbox: &Path, now: DateTime<Local>) -> PathBuf {
    inbox
        .join(now.year().to_string())
        .join(format!("{:02}", now.month()))
}

/// Apply the duplicate policy within `dir`. Only an actual collision changes
/// the name.
fn unique_filename(
    dir: &Path,
    filename: &str,
    duplicates: DuplicateHandling,
    now: DateTime<Local>,
) -> String {
    if !dir.join(filename).exists() {
        return filename.to_string();
    }

    let (base, extension) = split_extension(filename);
    match duplicates {
        DuplicateHandling::Overwrite => filename.to_string(),
        DuplicateHandling::Uuid => {
            let suffix = Uuid::new_v4().simple().to_string();
            format!("{base}_{}{extension}", &suffix[..8])
        }
        DuplicateHandling::Rename => (1..=MAX_RENAME_ATTEMPTS)
            .map(|n| format!("{base} ({n}){extension}"))
            .find(|candidate| !dir.join(candidate).exists())
            .unwrap_or_else(|| {
                format!("{base}_{}{extension}", now.format("%Y%m%d_%H%M%S"))
            }),
    }
}

/// Split `name` into stem and extension, the extension keeping its dot.
///
/// Dotfiles such as `.bashrc` have no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name.split_at(idx),
        _ => (name, ""),
    }
}
