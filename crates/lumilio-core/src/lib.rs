//! Repository storage core for Lumilio
//!
//! Every uploaded byte passes through here once: it is staged under
//! `.lumilio/staging`, placed into `inbox` according to the repository's
//! configuration, and may later be soft-deleted into `.lumilio/trash`.
//!
//! # Components
//!
//! - [`DirectoryManager`] - physical layout, permissions, staging, temp and trash primitives
//! - [`StagingManager`] - configuration-driven inbox placement
//! - [`RepositoryManager`] - registry and lifecycle across many roots

pub mod directory;
pub mod error;
pub mod repository;
pub mod staging;

pub use directory::{
    CleanupReport, DefaultDirectoryManager, DeleteMetadata, DirectoryManager, StagingFile,
    StructureValidation, TempFile, TrashFile,
};
pub use error::{Error, Result};
pub use repository::{
    InMemoryRepositoryStore, Repository, RepositoryManager, RepositoryStatus, RepositoryStore,
    ValidationResult,
};
pub use staging::{CAS_MIN_HASH_LEN, DefaultStagingManager, StagingManager};
