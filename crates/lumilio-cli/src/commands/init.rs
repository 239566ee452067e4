//! Init command implementation
//!
//! Creates the on-disk structure and configuration for a new repository.

use std::path::Path;

use colored::Colorize;
use lumilio_core::{Repository, RepositoryManager};
use lumilio_meta::{DuplicateHandling, RepositoryConfig, StorageStrategy};

use crate::error::{CliError, Result};

/// Run the init command
pub fn run_init(
    path: &Path,
    name: Option<&str>,
    strategy: StorageStrategy,
    duplicates: DuplicateHandling,
) -> Result<()> {
    println!(
        "{} Initializing {} repository in {}...",
        "=>".blue().bold(),
        strategy.to_string().cyan(),
        path.display()
    );

    let repository = init_repository(path, name, strategy, duplicates)?;

    println!("   Id:     {}", repository.id.yellow());
    println!("   Name:   {}", repository.name);
    println!("   Layout: {}", strategy.example_path());
    println!("{} Repository initialized!", "OK".green().bold());
    Ok(())
}

/// Initialize a repository at `path` and return its registry entry.
pub fn init_repository(
    path: &Path,
    name: Option<&str>,
    strategy: StorageStrategy,
    duplicates: DuplicateHandling,
) -> Result<Repository> {
    let name = match name {
        Some(name) => name.to_string(),
        None => default_name(path)?,
    };

    let config = RepositoryConfig::builder(name)
        .storage_strategy(strategy)
        .duplicate_handling(duplicates)
        .build();

    let mut manager = RepositoryManager::in_memory();
    Ok(manager.initialize_repository(path, config)?)
}

/// Directory name of `path`, made absolute first so `.` works.
fn default_name(path: &Path) -> Result<String> {
    let absolute = lumilio_fs::io::absolutize(path)?;
    absolute
        .file_name()
        .map(str::to_string)
        .ok_or_else(|| CliError::user("Cannot derive a name from this path; pass --name"))
}
