//! Command implementations for lumilio-cli

pub mod cleanup;
pub mod ingest;
pub mod init;
pub mod trash;
pub mod validate;

pub use cleanup::run_cleanup;
pub use ingest::{run_ingest, run_resolve};
pub use init::run_init;
pub use trash::{run_trash_list, run_trash_move, run_trash_purge, run_trash_recover};
pub use validate::{run_repair, run_validate};
