//! Cleanup command implementation

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use lumilio_core::{CleanupReport, DefaultDirectoryManager, DirectoryManager};

use crate::error::Result;

/// Run the cleanup command
pub fn run_cleanup(root: &Path, max_age: Duration, temp_max_age: Duration) -> Result<()> {
    println!("{} Cleaning up {}...", "=>".blue().bold(), root.display());

    let (staging, temp) = cleanup(root, max_age, temp_max_age)?;
    println!("   Staging: {} removed ({} bytes)", staging.removed, staging.bytes);
    println!("   Temp:    {} removed ({} bytes)", temp.removed, temp.bytes);
    println!("{} Cleanup complete", "OK".green().bold());
    Ok(())
}

/// Sweep staging and temp, returning each area's report.
pub fn cleanup(
    root: &Path,
    max_age: Duration,
    temp_max_age: Duration,
) -> Result<(CleanupReport, CleanupReport)> {
    let directories = DefaultDirectoryManager::new();
    let staging = directories.cleanup_staging(root, max_age)?;
    let temp = directories.cleanup_temp_files(root, temp_max_age)?;
    Ok((staging, temp))
}
