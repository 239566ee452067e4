//! Soft deletion into `.lumilio/trash`
//!
//! Each trashed file is renamed to `<id>_<basename>` and described by a
//! JSON sidecar named `<id>_<basename>.json`.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use lumilio_fs::{NormalizedPath, RepoPath, RepositoryLayout, RobustnessConfig};
use uuid::Uuid;

use super::{CleanupReport, DeleteMetadata, TrashFile, sweep};
use crate::{Error, Result};

const SIDECAR_SUFFIX: &str = ".json";

/// A content entry found in the trash directory.
struct Entry {
    id: String,
    path: PathBuf,
}

pub(super) fn move_to_trash(
    layout: &RepositoryLayout,
    path: &Path,
    mut metadata: DeleteMetadata,
) -> Result<TrashFile> {
    let relative = layout
        .relative(path)
        .ok_or_else(|| Error::path(path, "path is outside the repository"))?;
    if RepositoryLayout::is_reserved_relative(&relative) {
        return Err(Error::path(path, "repository system paths cannot be trashed"));
    }

    let source = layout.join(&relative).to_native();
    match fs::symlink_metadata(&source) {
        Ok(meta) if meta.is_dir() => {
            return Err(Error::path(&source, "only files can be moved to trash"));
        }
        Ok(_) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(Error::NotFound(format!("file {}", source.display())));
        }
        Err(e) => return Err(Error::io(&source, e)),
    }

    if metadata.deleted_at.is_none() {
        metadata.deleted_at = Some(Utc::now());
    }
    if metadata.original_path.trim().is_empty() {
        metadata.original_path = relative.clone();
    }
    let sidecar_json = serde_json::to_vec_pretty(&metadata)?;

    let trash_dir = layout.path(RepoPath::Trash).to_native();
    fs::create_dir_all(&trash_dir).map_err(|e| Error::io(&trash_dir, e))?;

    let id = Uuid::new_v4().to_string();
    let basename = NormalizedPath::new(&relative)
        .file_name()
        .unwrap_or(super::FALLBACK_FILENAME)
        .to_string();
    let trash_path = trash_dir.join(format!("{id}_{basename}"));

    fs::rename(&source, &trash_path).map_err(|e| Error::io(&source, e))?;

    let sidecar = sidecar_path(&trash_path);
    lumilio_fs::io::write_atomic(
        &NormalizedPath::new(&sidecar),
        &sidecar_json,
        RobustnessConfig::default(),
    )
    .inspect_err(|e| {
        tracing::warn!(
            %id,
            path = %trash_path.display(),
            error = %e,
            "Trashed content has no metadata sidecar"
        );
    })?;

    tracing::info!(%id, original = %relative, "Moved file to trash");
    Ok(TrashFile {
        id,
        repo_root: layout.root().to_native(),
        trash_path,
        metadata: Some(metadata),
    })
}

pub(super) fn list(layout: &RepositoryLayout) -> Result<Vec<TrashFile>> {
    let root = layout.root().to_native();
    Ok(scan(layout)?
        .into_iter()
        .map(|entry| TrashFile {
            metadata: read_sidecar(&entry.path),
            id: entry.id,
            repo_root: root.clone(),
            trash_path: entry.path,
        })
        .collect())
}

pub(super) fn recover(layout: &RepositoryLayout, trash_id: &str) -> Result<PathBuf> {
    let entry = scan(layout)?
        .into_iter()
        .find(|entry| entry.id == trash_id)
        .ok_or_else(|| Error::NotFound(format!("trash item {trash_id}")))?;

    let metadata = read_sidecar(&entry.path)
        .filter(|metadata| !metadata.original_path.trim().is_empty())
        .ok_or_else(|| {
            Error::NotFound(format!("original path metadata for trash item {trash_id}"))
        })?;
    let original = Path::new(&metadata.original_path);
    let relative = layout
        .relative(original)
        .filter(|relative| {
            !relative.is_empty() && !RepositoryLayout::is_reserved_relative(relative)
        })
        .ok_or_else(|| Error::path(original, "original path is outside the repository"))?;

    let destination = layout.join(&relative).to_native();
    if fs::symlink_metadata(&destination).is_ok() {
        return Err(Error::AlreadyExists { path: destination });
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    fs::rename(&entry.path, &destination).map_err(|e| Error::io(&destination, e))?;

    let sidecar = sidecar_path(&entry.path);
    if let Err(e) = fs::remove_file(&sidecar) {
        tracing::warn!(path = %sidecar.display(), error = %e, "Failed to remove trash sidecar");
    }

    tracing::info!(id = %trash_id, restored = %relative, "Recovered file from trash");
    Ok(PathBuf::from(relative))
}

/// Delete entries whose deletion time is strictly before `cutoff`.
///
/// A parseable sidecar's `deleted_at` decides; without one the content's
/// mtime does.
pub(super) fn purge(layout: &RepositoryLayout, cutoff: DateTime<Utc>) -> Result<CleanupReport> {
    let mut report = CleanupReport::default();
    for entry in scan(layout)? {
        let Ok(meta) = fs::symlink_metadata(&entry.path) else {
            continue;
        };
        let deleted_at = match read_sidecar(&entry.path).and_then(|m| m.deleted_at) {
            Some(deleted_at) => deleted_at,
            None => match meta.modified() {
                Ok(modified) => sweep::modified_at(modified),
                Err(_) => continue,
            },
        };
        if deleted_at >= cutoff {
            continue;
        }

        if let Err(e) = fs::remove_file(&entry.path) {
            tracing::warn!(path = %entry.path.display(), error = %e, "Failed to purge trash entry");
            continue;
        }
        let sidecar = sidecar_path(&entry.path);
        match fs::remove_file(&sidecar) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    path = %sidecar.display(),
                    error = %e,
                    "Failed to purge trash sidecar"
                );
            }
        }
        report.removed += 1;
        report.bytes += meta.len();
        tracing::debug!(id = %entry.id, "Purged trash entry");
    }
    Ok(report)
}

/// Content entries in the trash, sorted by name.
///
/// `X.json` is a sidecar when `X` is also present, so trashed JSON files
/// are still listed.
fn scan(layout: &RepositoryLayout) -> Result<Vec<Entry>> {
    let trash_dir = layout.path(RepoPath::Trash).to_native();
    let read = match fs::read_dir(&trash_dir) {
        Ok(read) => read,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(&trash_dir, e)),
    };

    let mut names = Vec::new();
    for entry in read {
        let entry = entry.map_err(|e| Error::io(&trash_dir, e))?;
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            continue;
        }
        // Atomic-write temp files are not trash content.
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') && name.ends_with(".tmp") {
            continue;
        }
        names.push(name);
    }
    names.sort();

    let present: HashSet<&str> = names.iter().map(String::as_str).collect();
    let entries = names
        .iter()
        .filter(|name| {
            name.strip_suffix(SIDECAR_SUFFIX)
                .is_none_or(|content| !present.contains(content))
        })
        .map(|name| Entry {
            id: name
                .split_once('_')
                .map_or(name.as_str(), |(id, _)| id)
                .to_string(),
            path: trash_dir.join(name),
        })
        .collect();
    Ok(entries)
}

fn read_sidecar(content: &Path) -> Option<DeleteMetadata> {
    let sidecar = sidecar_path(content);
    let bytes = match fs::read(&sidecar) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            tracing::warn!(path = %sidecar.display(), error = %e, "Unreadable trash sidecar");
            return None;
        }
    };
    serde_json::from_slice(&bytes)
        .inspect_err(|e| {
            tracing::warn!(path = %sidecar.display(), error = %e, "Malformed trash sidecar");
        })
        .ok()
}

fn sidecar_path(content: &Path) -> PathBuf {
    let mut name = OsString::from(content.as_os_str());
    name.push(SIDECAR_SUFFIX);
    PathBuf::from(name)
}
