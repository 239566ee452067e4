//! Validate and repair commands
//!
//! `validate` reports problems without touching the disk. `repair` recreates
//! missing system directories and reapplies permissions.

use std::path::Path;

use colored::Colorize;
use lumilio_core::{DefaultDirectoryManager, DirectoryManager, RepositoryManager, ValidationResult};

use crate::error::{CliError, Result};

/// Run the validate command
///
/// Exits with an error when the repository is not valid, after printing
/// the findings.
pub fn run_validate(path: &Path, json: bool) -> Result<()> {
    let result = RepositoryManager::in_memory().validate_repository(path);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_validation(path, &result);
    }

    if result.valid {
        Ok(())
    } else {
        Err(CliError::user(format!(
            "{} is not a valid repository ({} error(s))",
            path.display(),
            result.errors.len()
        )))
    }
}

fn print_validation(path: &Path, result: &ValidationResult) {
    println!("{} Validating {}...", "=>".blue().bold(), path.display());
    for error in &result.errors {
        println!("   {} {}", "x".red().bold(), error);
    }
    for warning in &result.warnings {
        println!("   {} {}", "!".yellow().bold(), warning);
    }
    if result.valid {
        println!("{} Repository is valid", "OK".green().bold());
    }
}

/// Run the repair command
pub fn run_repair(path: &Path) -> Result<()> {
    println!("{} Repairing {}...", "=>".blue().bold(), path.display());

    let directories = DefaultDirectoryManager::new();
    let before = directories.validate_structure(path)?;
    directories.repair_structure(path)?;

    for dir in &before.missing_directories {
        println!("   {} {}", "+".green(), dir);
    }
    if before.missing_directories.is_empty() {
        println!("   Nothing was missing");
    }
    println!("{} Structure repaired", "OK".green().bold());
    Ok(())
}
