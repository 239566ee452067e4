use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use lumilio_fs::layout::{LOG_PLACEHOLDERS, ACCESS_CHECK_FILE, REQUIRED_DIRECTORIES};
use lumilio_fs::{NormalizedPath, RepoPath, RepositoryLayout, sanitize_file_name};
use uuid::Uuid;

use super::{
    CleanupReport, DeleteMetadata, DirectoryManager, StagingFile, StructureValidation, TempFile,
    TrashFile, resolve_root, sweep, trash,
};
use crate::{Error, Result};

/// Fallback name for uploads whose filename has no usable component.
pub(crate) const FALLBACK_FILENAME: &str = "upload";

/// Stateless [`DirectoryManager`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultDirectoryManager;

impl DefaultDirectoryManager {
    pub fn new() -> Self {
        Self
    }
}

impl DirectoryManager for DefaultDirectoryManager {
    fn create_structure(&self, root: &Path) -> Result<()> {
        let layout = resolve_root(root)?;
        let root_dir = layout.root().to_native();
        if root_dir.exists() && !root_dir.is_dir() {
            return Err(Error::Structure {
                path: root_dir,
                message: "repository root is not a directory".into(),
            });
        }

        for dir in REQUIRED_DIRECTORIES {
            let path = layout.join(dir).to_native();
            fs::create_dir_all(&path).map_err(|e| Error::access(&path, e))?;
        }
        let seeded = seed_log_placeholders(&layout)?;
        self.protect_system_directories(root)?;

        tracing::debug!(root = %layout.root(), seeded, "Created repository structure");
        Ok(())
    }

    fn validate_structure(&self, root: &Path) -> Result<StructureValidation> {
        let layout = resolve_root(root)?;
        let root_dir = layout.root().to_native();
        let mut validation = StructureValidation::default();

        match fs::metadata(&root_dir) {
            Ok(meta) if !meta.is_dir() => {
                validation
                    .invalid_paths
                    .push("Repository root is not a directory".into());
                return Ok(validation);
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                validation
                    .invalid_paths
                    .push("Repository root does not exist".into());
                return Ok(validation);
            }
            Err(e) => return Err(Error::io(&root_dir, e)),
        }

        for dir in REQUIRED_DIRECTORIES {
            let path = layout.join(dir).to_native();
            match fs::metadata(&path) {
                Ok(meta) if meta.is_dir() => {}
                Ok(_) => validation
                    .invalid_paths
                    .push(format!("Expected directory but found file: {dir}")),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    validation.missing_directories.push(dir.to_string());
                    validation.warnings.push(format!("Missing directory: {dir}"));
                }
                Err(e) => validation
                    .permission_issues
                    .push(format!("Cannot access directory {dir}: {e}")),
            }
        }

        // Absent areas are already reported as missing.
        for area in [RepoPath::SystemDir, RepoPath::Inbox] {
            let path = layout.path(area).to_native();
            if path.is_dir()
                && let Err(message) = check_access(&path)
            {
                validation
                    .permission_issues
                    .push(format!("Permission issue with {area}: {message}"));
            }
        }

        validation.valid =
            validation.invalid_paths.is_empty() && validation.permission_issues.is_empty();
        Ok(validation)
    }

    fn repair_structure(&self, root: &Path) -> Result<()> {
        let layout = resolve_root(root)?;
        let validation = self.validate_structure(root)?;
        if !validation.invalid_paths.is_empty() {
            return Err(Error::Structure {
                path: layout.root().to_native(),
                message: validation.invalid_paths.join("; "),
            });
        }

        for dir in &validation.missing_directories {
            let path = layout.join(dir).to_native();
            fs::create_dir_all(&path).map_err(|e| Error::access(&path, e))?;
        }
        let seeded = seed_log_placeholders(&layout)?;
        self.protect_system_directories(root)?;

        tracing::info!(
            root = %layout.root(),
            recreated = validation.missing_directories.len(),
            seeded,
            "Repaired repository structure"
        );
        Ok(())
    }

    fn protect_system_directories(&self, root: &Path) -> Result<()> {
        let layout = resolve_root(root)?;
        apply_permission_policy(&layout)
    }

    fn is_protected_path(&self, root: &Path, path: &Path) -> bool {
        let Ok(layout) = resolve_root(root) else {
            return true;
        };
        layout
            .relative(path)
            .is_some_and(|relative| RepositoryLayout::is_protected_relative(&relative))
    }

    fn create_staging_file(&self, root: &Path, filename: &str) -> Result<StagingFile> {
        let layout = resolve_root(root)?;
        let dir = layout.path(RepoPath::StagingIncoming).to_native();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let id = Uuid::new_v4().to_string();
        let filename = sanitize_file_name(filename, FALLBACK_FILENAME);
        let path = dir.join(format!("{id}_{filename}"));
        lumilio_fs::io::create_new_empty(&path)?;

        tracing::debug!(%id, path = %path.display(), "Created staging file");
        Ok(StagingFile {
            id,
            repo_root: layout.root().to_native(),
            path,
            filename,
            created_at: Utc::now(),
        })
    }

    fn commit_staging_file(&self, staging: &StagingFile, final_relative: &Path) -> Result<()> {
        let layout = resolve_root(&staging.repo_root)?;
        let destination = commit_destination(&layout, final_relative)?.to_native();

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::rename(&staging.path, &destination).map_err(|e| {
            if e.kind() == ErrorKind::NotFound && !staging.path.exists() {
                Error::NotFound(format!("staging file {}", staging.path.display()))
            } else {
                Error::io(&destination, e)
            }
        })?;

        tracing::info!(
            id = %staging.id,
            destination = %final_relative.display(),
            "Committed staging file"
        );
        Ok(())
    }

    fn cleanup_staging(&self, root: &Path, max_age: Duration) -> Result<CleanupReport> {
        let layout = resolve_root(root)?;
        let cutoff = sweep::cutoff(max_age);
        let mut report = CleanupReport::default();
        for area in [RepoPath::StagingIncoming, RepoPath::StagingFailed] {
            report.merge(sweep::remove_older_than(
                &layout.path(area).to_native(),
                cutoff,
            )?);
        }
        tracing::debug!(
            root = %layout.root(),
            removed = report.removed,
            bytes = report.bytes,
            "Swept staging"
        );
        Ok(report)
    }

    fn create_temp_file(&self, root: &Path, purpose: &str) -> Result<TempFile> {
        let layout = resolve_root(root)?;
        let dir = layout.path(RepoPath::Temp).to_native();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

        let id = Uuid::new_v4().to_string();
        let purpose = sanitize_file_name(purpose, "temp");
        let path = dir.join(format!("{purpose}_{id}.tmp"));
        lumilio_fs::io::create_new_empty(&path)?;

        Ok(TempFile {
            id,
            repo_root: layout.root().to_native(),
            path,
            purpose,
            created_at: Utc::now(),
        })
    }

    fn cleanup_temp_files(&self, root: &Path, max_age: Duration) -> Result<CleanupReport> {
        let layout = resolve_root(root)?;
        let temp = layout.path(RepoPath::Temp).to_native();
        let report = sweep::remove_older_than(&temp, sweep::cutoff(max_age))?;
        tracing::debug!(
            root = %layout.root(),
            removed = report.removed,
            bytes = report.bytes,
            "Swept temp files"
        );
        Ok(report)
    }

    fn move_to_trash(
        &self,
        root: &Path,
        path: &Path,
        metadata: Option<DeleteMetadata>,
    ) -> Result<TrashFile> {
        let layout = resolve_root(root)?;
        trash::move_to_trash(&layout, path, metadata.unwrap_or_default())
    }

    fn list_trash_files(&self, root: &Path) -> Result<Vec<TrashFile>> {
        let layout = resolve_root(root)?;
        trash::list(&layout)
    }

    fn recover_from_trash(&self, root: &Path, trash_id: &str) -> Result<PathBuf> {
        let layout = resolve_root(root)?;
        trash::recover(&layout, trash_id)
    }

    fn purge_trash(&self, root: &Path, older_than: Duration) -> Result<CleanupReport> {
        let layout = resolve_root(root)?;
        trash::purge(&layout, sweep::cutoff(older_than))
    }
}

/// Validate a commit target and return its absolute location.
fn commit_destination(layout: &RepositoryLayout, final_relative: &Path) -> Result<NormalizedPath> {
    if final_relative.to_string_lossy().trim().is_empty() {
        return Err(Error::path(final_relative, "final path cannot be empty"));
    }
    if final_relative.has_root() || NormalizedPath::new(final_relative).is_absolute() {
        return Err(Error::path(
            final_relative,
            "final path must be repository-relative",
        ));
    }
    let relative = layout
        .relative(final_relative)
        .filter(|relative| !relative.is_empty())
        .ok_or_else(|| Error::path(final_relative, "final path escapes the repository root"))?;
    if RepositoryLayout::is_reserved_relative(&relative) {
        return Err(Error::path(
            final_relative,
            "final path is reserved for repository metadata",
        ));
    }
    Ok(layout.join(&relative))
}

/// Write each missing log placeholder. Returns how many were created.
fn seed_log_placeholders(layout: &RepositoryLayout) -> Result<usize> {
    let mut seeded = 0;
    for (relative, header) in LOG_PLACEHOLDERS {
        let path = layout.join(relative).to_native();
        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(Error::io(&path, e)),
        };
        file.write_all(header.as_bytes())
            .map_err(|e| Error::io(&path, e))?;
        seeded += 1;
    }
    Ok(seeded)
}

/// Check read and write access to `dir` with a throwaway file.
pub(crate) fn check_access(dir: &Path) -> std::result::Result<(), String> {
    fs::read_dir(dir).map_err(|e| format!("cannot read directory: {e}"))?;
    let marker = dir.join(ACCESS_CHECK_FILE);
    File::create(&marker).map_err(|e| format!("cannot write to directory: {e}"))?;
    if let Err(e) = fs::remove_file(&marker) {
        tracing::warn!(path = %marker.display(), error = %e, "Failed to remove access check file");
    }
    Ok(())
}

#[cfg(unix)]
fn apply_permission_policy(layout: &RepositoryLayout) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    for (area, mode) in lumilio_fs::layout::PERMISSION_POLICY {
        let path = layout.path(*area).to_native();
        if path.is_dir() {
            fs::set_permissions(&path, fs::Permissions::from_mode(*mode))
                .map_err(|e| Error::access(&path, e))?;
        }
    }
    Ok(())
}

#[cfg(not(unix))]
fn apply_permission_policy(_layout: &RepositoryLayout) -> Result<()> {
    Ok(())
}
