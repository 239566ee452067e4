//! Reserved names inside a repository root.

use std::path::Path;

/// Well-known locations inside a Lumilio repository.
///
/// `ConfigFile` and `SystemDir` are reserved at every repository root and
/// never hold inbox content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepoPath {
    /// The `.lumiliorepo` configuration file
    ConfigFile,
    /// The `.lumilio` system directory
    SystemDir,
    /// Structured uploads
    Inbox,
    /// Derived assets root
    Assets,
    Thumbnails,
    Videos,
    Audios,
    /// Upload staging root
    Staging,
    /// Files currently being uploaded
    StagingIncoming,
    /// Uploads that failed processing
    StagingFailed,
    /// Scratch space for processing
    Temp,
    /// Soft-deleted content
    Trash,
    Logs,
    /// Config version backups
    Backups,
}

impl RepoPath {
    /// Root-relative location, always with forward slashes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigFile => ".lumiliorepo",
            Self::SystemDir => ".lumilio",
            Self::Inbox => "inbox",
            Self::Assets => ".lumilio/assets",
            Self::Thumbnails => ".lumilio/assets/thumbnails",
            Self::Videos => ".lumilio/assets/videos",
            Self::Audios => ".lumilio/assets/audios",
            Self::Staging => ".lumilio/staging",
            Self::StagingIncoming => ".lumilio/staging/incoming",
            Self::StagingFailed => ".lumilio/staging/failed",
            Self::Temp => ".lumilio/temp",
            Self::Trash => ".lumilio/trash",
            Self::Logs => ".lumilio/logs",
            Self::Backups => ".lumilio/backups",
        }
    }
}

impl AsRef<Path> for RepoPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for RepoPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for RepoPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
