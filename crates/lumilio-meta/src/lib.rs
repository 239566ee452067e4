//! Repository configuration for Lumilio repository storage
//!
//! The `.lumiliorepo` file at each repository root is the single source of
//! truth for placement policy. This crate owns its schema, defaults,
//! validation and persistence.

pub mod config;
pub mod error;
pub mod ignore;

pub use config::{
    CONFIG_VERSION, DuplicateHandling, LocalSettings, RepositoryConfig, RepositoryConfigBuilder,
    StorageStrategy, SyncSettings, is_repository_root, parse_interval,
};
pub use error::{Error, Result};
pub use ignore::DEFAULT_IGNORE_PATTERNS;
