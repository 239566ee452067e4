//! Repository registry and lifecycle

mod manager;
mod store;
mod validation;

pub use manager::RepositoryManager;
pub use store::{InMemoryRepositoryStore, RepositoryStore};
pub use validation::ValidationResult;

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use lumilio_meta::RepositoryConfig;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a registered repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryStatus {
    #[default]
    Active,
    Scanning,
    Error,
    Offline,
}

impl fmt::Display for RepositoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Scanning => write!(f, "scanning"),
            Self::Error => write!(f, "error"),
            Self::Offline => write!(f, "offline"),
        }
    }
}

/// A registered repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repository {
    pub id: String,
    pub name: String,
    /// Canonical absolute root
    pub path: PathBuf,
    pub status: RepositoryStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Snapshot of `.lumiliorepo` at registration or last update
    pub config: RepositoryConfig,
}

impl Repository {
    /// A new active row for `config` rooted at `path`.
    pub fn new(path: PathBuf, config: RepositoryConfig) -> Self {
        Self {
            id: config.id.clone(),
            name: config.name.clone(),
            path,
            status: RepositoryStatus::Active,
            created_at: config.created_at,
            updated_at: Utc::now(),
            config,
        }
    }
}
