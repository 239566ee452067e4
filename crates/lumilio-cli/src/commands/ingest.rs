//! Ingest and resolve commands
//!
//! `ingest` runs a file through the same stage-then-commit path an upload
//! takes. `resolve` previews the placement only.

use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use colored::Colorize;
use lumilio_core::{DefaultStagingManager, StagingManager};
use sha2::{Digest, Sha256};

use crate::error::{CliError, Result};

/// Run the ingest command
pub fn run_ingest(root: &Path, file: &Path, hash: Option<&str>) -> Result<()> {
    let destination = ingest_file(root, file, hash)?;
    println!(
        "{} Stored {} at {}",
        "OK".green().bold(),
        file.display(),
        destination.display().to_string().cyan()
    );
    Ok(())
}

/// Stage `file` under `root` and commit it into the inbox.
///
/// Returns the root-relative destination. A failed commit leaves the staged
/// copy in place for the staging sweep.
pub fn ingest_file(root: &Path, file: &Path, hash: Option<&str>) -> Result<PathBuf> {
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| CliError::user(format!("{} is not a file", file.display())))?;

    let hash = match hash {
        Some(hash) => hash.to_string(),
        None => sha256_hex(file)?,
    };
    tracing::debug!(file = %file.display(), %hash, "Ingesting file");

    let staging = DefaultStagingManager::new();
    let staged = staging.create_staging_file(root, &filename)?;
    let mut reader = BufReader::new(File::open(file)?);
    let size = staged.write_from(&mut reader)?;
    tracing::debug!(id = %staged.id, size, "Staged upload");

    Ok(staging.commit_staging_file_to_inbox(&staged, Some(&hash))?)
}

/// Hex-encoded SHA-256 of a file's content.
pub fn sha256_hex(path: &Path) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut reader = BufReader::new(File::open(path)?);
    io::copy(&mut reader, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// Run the resolve command
pub fn run_resolve(root: &Path, filename: &str, hash: Option<&str>) -> Result<()> {
    let destination = DefaultStagingManager::new().resolve_inbox_path(root, filename, hash)?;
    println!("{}", destination.display());
    Ok(())
}
