//! Error types for lumilio-meta

use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Filesystem error: {0}")]
    Fs(#[from] lumilio_fs::Error),

    /// No config file at the root. Callers offer to recreate it.
    #[error("Repository configuration not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// The file exists but is not a readable config document.
    #[error("Failed to parse repository configuration at {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },

    /// A single field failed validation.
    #[error("{field}: {message}")]
    InvalidField { field: &'static str, message: String },

    /// A loaded config failed validation.
    #[error("Invalid repository configuration at {path}: {message}")]
    InvalidConfig { path: PathBuf, message: String },

    #[error("Unknown storage strategy '{value}', must be one of: date, cas, flat")]
    UnknownStrategy { value: String },

    #[error("Unknown duplicate handling '{value}', must be one of: rename, uuid, overwrite")]
    UnknownDuplicateHandling { value: String },
}

impl Error {
    /// True when the config is absent rather than broken.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::ConfigNotFound { .. })
    }
}
