//! Filesystem primitives for Lumilio repository storage
//!
//! Provides normalized path handling, the reserved repository layout and
//! safe I/O operations shared by the higher layers.

pub mod config;
pub mod constants;
pub mod error;
pub mod io;
pub mod layout;
pub mod path;

pub use config::{ConfigFormat, ConfigStore};
pub use constants::RepoPath;
pub use error::{Error, Result};
pub use io::RobustnessConfig;
pub use layout::RepositoryLayout;
pub use path::{NormalizedPath, sanitize_file_name};
