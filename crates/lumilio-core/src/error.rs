//! Error types for lumilio-core

use std::path::PathBuf;

/// Result type for lumilio-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in lumilio-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unresolvable root, or a relative path that is absolute or escapes the root
    #[error("Invalid path {path}: {reason}")]
    Path { path: PathBuf, reason: String },

    /// A required location has the wrong type
    #[error("Repository structure error at {path}: {message}")]
    Structure { path: PathBuf, message: String },

    /// The OS refused a create or chmod inside the repository
    #[error("Permission denied at {path}: {message}")]
    Permission { path: PathBuf, message: String },

    #[error("Cannot use {path}: nested inside repository at {parent}")]
    NestedRepository { path: PathBuf, parent: PathBuf },

    /// Trash id, staging file or repository id
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {path}")]
    AlreadyExists { path: PathBuf },

    #[error("Repository already registered: {0}")]
    AlreadyRegistered(String),

    /// The repository failed validation and cannot be adopted
    #[error("Invalid repository at {path}: {}", errors.join("; "))]
    InvalidRepository { path: PathBuf, errors: Vec<String> },

    #[error("File {path} is {size} bytes, limit is {limit}")]
    FileTooLarge { path: PathBuf, size: u64, limit: u64 },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Transparent wrappers for underlying crate errors
    /// Configuration error from lumilio-meta
    #[error(transparent)]
    Config(#[from] lumilio_meta::Error),

    /// Filesystem error from lumilio-fs
    #[error(transparent)]
    Fs(#[from] lumilio_fs::Error),

    /// Trash sidecar serialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Like [`Error::io`], but a denied operation becomes [`Error::Permission`].
    pub(crate) fn access(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            Self::Permission {
                path: path.into(),
                message: source.to_string(),
            }
        } else {
            Self::io(path, source)
        }
    }

    pub(crate) fn path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Path {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use std::path::Path;

    #[test]
    fn denied_access_maps_to_permission() {
        let denied = std::io::Error::from(ErrorKind::PermissionDenied);
        let err = Error::access("/repo/.lumilio", denied);
        assert!(matches!(
            err,
            Error::Permission { ref path, .. } if path == Path::new("/repo/.lumilio")
        ));
        assert!(err.to_string().starts_with("Permission denied at /repo/.lumilio"));
    }

    #[test]
    fn other_access_failures_stay_io() {
        let missing = std::io::Error::from(ErrorKind::NotFound);
        let err = Error::access("/repo/inbox", missing);
        assert!(matches!(err, Error::Io { .. }));
    }
}
