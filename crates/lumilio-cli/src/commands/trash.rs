//! Trash command implementations

use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use lumilio_core::{DefaultDirectoryManager, DeleteMetadata, DirectoryManager, TrashFile};

use crate::error::Result;

/// Run `trash list`
pub fn run_trash_list(root: &Path, json: bool) -> Result<()> {
    let entries = DefaultDirectoryManager::new().list_trash_files(root)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("Trash is empty");
        return Ok(());
    }
    for entry in &entries {
        print_entry(entry);
    }
    println!();
    println!("{} entr{} in trash", entries.len(), if entries.len() == 1 { "y" } else { "ies" });
    Ok(())
}

fn print_entry(entry: &TrashFile) {
    match &entry.metadata {
        Some(meta) => {
            let deleted = meta
                .deleted_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "unknown".into());
            println!(
                "{}  {}  {}",
                entry.id.yellow(),
                deleted,
                meta.original_path
            );
            if let Some(reason) = &meta.reason {
                println!("    reason: {reason}");
            }
        }
        None => println!("{}  {}", entry.id.yellow(), "(no metadata)".dimmed()),
    }
}

/// Run `trash move`
pub fn run_trash_move(
    root: &Path,
    path: &Path,
    reason: Option<String>,
    asset_id: Option<String>,
    user_id: Option<String>,
) -> Result<()> {
    let metadata = DeleteMetadata {
        reason,
        asset_id,
        user_id,
        ..DeleteMetadata::default()
    };
    let entry = DefaultDirectoryManager::new().move_to_trash(root, path, Some(metadata))?;
    println!(
        "{} Moved {} to trash as {}",
        "OK".green().bold(),
        path.display(),
        entry.id.yellow()
    );
    Ok(())
}

/// Run `trash recover`
pub fn run_trash_recover(root: &Path, id: &str) -> Result<()> {
    let restored = DefaultDirectoryManager::new().recover_from_trash(root, id)?;
    println!(
        "{} Restored {}",
        "OK".green().bold(),
        restored.display().to_string().cyan()
    );
    Ok(())
}

/// Run `trash purge`
pub fn run_trash_purge(root: &Path, older_than: Duration) -> Result<()> {
    let report = DefaultDirectoryManager::new().purge_trash(root, older_than)?;
    println!(
        "{} Purged {} entr{} ({} bytes)",
        "OK".green().bold(),
        report.removed,
        if report.removed == 1 { "y" } else { "ies" },
        report.bytes
    );
    Ok(())
}
