//! Physical layout of a Lumilio repository
//!
//! Every operation resolves the layout afresh from the root it is given, so
//! a `RepositoryLayout` is a cheap value, never shared state.

use std::path::Path;

use crate::{NormalizedPath, RepoPath, Result, io};

/// Directories that must exist under every repository root, parents first.
pub const REQUIRED_DIRECTORIES: &[&str] = &[
    ".lumilio",
    ".lumilio/assets",
    ".lumilio/assets/thumbnails",
    ".lumilio/assets/thumbnails/small",
    ".lumilio/assets/thumbnails/medium",
    ".lumilio/assets/thumbnails/large",
    ".lumilio/assets/videos",
    ".lumilio/assets/videos/web",
    ".lumilio/assets/audios",
    ".lumilio/assets/audios/web",
    ".lumilio/staging",
    ".lumilio/staging/incoming",
    ".lumilio/staging/failed",
    ".lumilio/temp",
    ".lumilio/trash",
    ".lumilio/logs",
    ".lumilio/backups",
    "inbox",
];

/// Log files seeded on creation, with their header line.
pub const LOG_PLACEHOLDERS: &[(&str, &str)] = &[
    (".lumilio/logs/app.log", "# Lumilio application logs\n"),
    (".lumilio/logs/error.log", "# Lumilio error logs\n"),
    (".lumilio/logs/operations.log", "# Lumilio operations logs\n"),
];

/// Throwaway file used to check write access.
pub const ACCESS_CHECK_FILE: &str = ".lumilio_permission_test";

/// Areas users must not write into directly.
pub const PROTECTED_AREAS: &[RepoPath] = &[RepoPath::SystemDir, RepoPath::Inbox];

/// Unix permission bits applied to system directories.
///
/// Staging and temp are owner-only; everything else is world-readable.
pub const PERMISSION_POLICY: &[(RepoPath, u32)] = &[
    (RepoPath::SystemDir, 0o755),
    (RepoPath::Assets, 0o755),
    (RepoPath::Thumbnails, 0o755),
    (RepoPath::Videos, 0o755),
    (RepoPath::Audios, 0o755),
    (RepoPath::Staging, 0o700),
    (RepoPath::Temp, 0o700),
    (RepoPath::Trash, 0o755),
    (RepoPath::Inbox, 0o755),
];

/// Resolved locations for one repository root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    root: NormalizedPath,
}

impl RepositoryLayout {
    /// Resolve `root` to an absolute path. Does not require it to exist.
    pub fn resolve(root: &Path) -> Result<Self> {
        Ok(Self {
            root: io::absolutize(root)?,
        })
    }

    /// The absolute repository root.
    pub fn root(&self) -> &NormalizedPath {
        &self.root
    }

    /// Absolute location of a well-known path.
    pub fn path(&self, which: RepoPath) -> NormalizedPath {
        self.root.join(which.as_str())
    }

    /// Absolute location of the configuration file.
    pub fn config_file(&self) -> NormalizedPath {
        self.path(RepoPath::ConfigFile)
    }

    /// Join a root-relative path onto the root.
    pub fn join(&self, relative: &str) -> NormalizedPath {
        self.root.join(relative)
    }

    /// Express `path` relative to the root.
    ///
    /// Relative inputs are taken as root-relative. Returns `None` when the
    /// path resolves outside the root.
    pub fn relative(&self, path: &Path) -> Option<String> {
        // Join the raw text so a leading ".." climbs out of the root instead
        // of being sandboxed away.
        let candidate = NormalizedPath::new(path);
        let absolute = if candidate.is_absolute() {
            candidate
        } else {
            self.root.join(&path.to_string_lossy())
        };
        absolute.strip_prefix(&self.root).map(str::to_string)
    }

    /// Whether a root-relative path names the root itself, the config file
    /// or anything in the system directory.
    pub fn is_reserved_relative(relative: &str) -> bool {
        let system = RepoPath::SystemDir.as_str();
        relative.is_empty()
            || relative == RepoPath::ConfigFile.as_str()
            || relative == system
            || relative
                .strip_prefix(system)
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Whether a root-relative path falls in a protected area.
    pub fn is_protected_relative(relative: &str) -> bool {
        PROTECTED_AREAS.iter().any(|area| {
            let prefix = area.as_str();
            relative == prefix
                || relative
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_directories_list_parents_first() {
        for (idx, dir) in REQUIRED_DIRECTORIES.iter().enumerate() {
            if let Some((parent, _)) = dir.rsplit_once('/') {
                let parent_idx = REQUIRED_DIRECTORIES
                    .iter()
                    .position(|d| *d == parent)
                    .unwrap_or_else(|| panic!("parent of {dir} missing"));
                assert!(parent_idx < idx, "{parent} must precede {dir}");
            }
        }
    }

    #[test]
    fn relative_rejects_escape() {
        let layout = RepositoryLayout::resolve(Path::new("/srv/photos")).unwrap();
        assert_eq!(layout.relative(Path::new("inbox/a.jpg")).as_deref(), Some("inbox/a.jpg"));
        assert_eq!(
            layout.relative(Path::new("/srv/photos/.lumilio/trash")).as_deref(),
            Some(".lumilio/trash")
        );
        assert_eq!(layout.relative(Path::new("/srv/other/a.jpg")), None);
        assert_eq!(layout.relative(Path::new("../other/a.jpg")), None);
    }

    #[test]
    fn reserved_covers_config_and_system_tree() {
        assert!(RepositoryLayout::is_reserved_relative(""));
        assert!(RepositoryLayout::is_reserved_relative(".lumiliorepo"));
        assert!(RepositoryLayout::is_reserved_relative(".lumilio"));
        assert!(RepositoryLayout::is_reserved_relative(".lumilio/trash/x"));
        assert!(!RepositoryLayout::is_reserved_relative(".lumilio-notes/a.txt"));
        assert!(!RepositoryLayout::is_reserved_relative("inbox/2024/01/a.jpg"));
    }

    #[test]
    fn protected_prefix_needs_component_boundary() {
        assert!(RepositoryLayout::is_protected_relative("inbox"));
        assert!(RepositoryLayout::is_protected_relative("inbox/2024/01/a.jpg"));
        assert!(RepositoryLayout::is_protected_relative(".lumilio/staging"));
        assert!(!RepositoryLayout::is_protected_relative("inboxes/a.jpg"));
        assert!(!RepositoryLayout::is_protected_relative(".lumiliorepo"));
        assert!(!RepositoryLayout::is_protected_relative("photos/a.jpg"));
    }
}
