//! CLI argument parsing using clap derive

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lumilio_meta::{DuplicateHandling, StorageStrategy};

/// Lumilio repository storage - manage photo and media repositories on disk
#[derive(Parser, Debug)]
#[command(name = "lumilio-repo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize a new repository
    ///
    /// Creates the .lumilio/ system tree, the inbox/ directory and a
    /// .lumiliorepo configuration file.
    ///
    /// Examples:
    ///   lumilio-repo init ~/Photos
    ///   lumilio-repo init ~/Archive --strategy cas
    ///   lumilio-repo init ~/Dump --strategy flat --duplicates uuid
    Init {
        /// Repository root (created if missing)
        path: PathBuf,

        /// Display name (defaults to the directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Storage strategy: date, cas or flat
        #[arg(short, long, default_value = "date", value_parser = parse_strategy)]
        strategy: StorageStrategy,

        /// Duplicate filename handling: rename, uuid or overwrite
        #[arg(short, long, default_value = "rename", value_parser = parse_duplicates)]
        duplicates: DuplicateHandling,
    },

    /// Check that a directory is a usable repository
    Validate {
        /// Repository root
        path: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Recreate missing system directories
    Repair {
        /// Repository root
        path: PathBuf,
    },

    /// Stage a file and commit it into the inbox
    Ingest {
        /// Repository root
        root: PathBuf,

        /// File to ingest
        file: PathBuf,

        /// Content hash for cas placement (sha256 of the file if omitted)
        #[arg(long)]
        hash: Option<String>,
    },

    /// Show where a file would be placed without writing anything
    Resolve {
        /// Repository root
        root: PathBuf,

        /// Original filename
        filename: String,

        /// Content hash for cas placement
        #[arg(long)]
        hash: Option<String>,
    },

    /// Remove stale staging and temp files
    Cleanup {
        /// Repository root
        root: PathBuf,

        /// Age after which staged uploads are removed
        #[arg(long, default_value = "24h", value_parser = parse_age)]
        max_age: Duration,

        /// Age after which temp files are removed
        #[arg(long, default_value = "1h", value_parser = parse_age)]
        temp_max_age: Duration,
    },

    /// Manage soft-deleted files
    Trash {
        #[command(subcommand)]
        action: TrashAction,
    },
}

/// Trash subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum TrashAction {
    /// List trashed entries
    List {
        /// Repository root
        root: PathBuf,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Move a file into the trash
    Move {
        /// Repository root
        root: PathBuf,

        /// File to trash, absolute or relative to the root
        path: PathBuf,

        /// Reason recorded in the sidecar
        #[arg(long)]
        reason: Option<String>,

        /// Asset id recorded in the sidecar
        #[arg(long)]
        asset_id: Option<String>,

        /// User id recorded in the sidecar
        #[arg(long)]
        user_id: Option<String>,
    },

    /// Restore a trashed entry to its original location
    Recover {
        /// Repository root
        root: PathBuf,

        /// Trash id as shown by `trash list`
        id: String,
    },

    /// Permanently delete old trash entries
    Purge {
        /// Repository root
        root: PathBuf,

        /// Delete entries trashed longer ago than this
        #[arg(long, default_value = "30days", value_parser = parse_age)]
        older_than: Duration,
    },
}

fn parse_strategy(value: &str) -> Result<StorageStrategy, String> {
    value.parse().map_err(|e: lumilio_meta::Error| e.to_string())
}

fn parse_duplicates(value: &str) -> Result<DuplicateHandling, String> {
    value.parse().map_err(|e: lumilio_meta::Error| e.to_string())
}

fn parse_age(value: &str) -> Result<Duration, String> {
    lumilio_meta::parse_interval(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_init_defaults() {
        let cli = Cli::parse_from(["lumilio-repo", "init", "/srv/photos"]);
        assert_eq!(
            cli.command,
            Commands::Init {
                path: PathBuf::from("/srv/photos"),
                name: None,
                strategy: StorageStrategy::Date,
                duplicates: DuplicateHandling::Rename,
            }
        );
    }

    #[test]
    fn parse_init_strategy_is_case_insensitive() {
        let cli = Cli::parse_from(["lumilio-repo", "init", "r", "--strategy", "CAS", "-d", "uuid"]);
        match cli.command {
            Commands::Init {
                strategy,
                duplicates,
                ..
            } => {
                assert_eq!(strategy, StorageStrategy::Cas);
                assert_eq!(duplicates, DuplicateHandling::Uuid);
            }
            other => panic!("expected init, got {other:?}"),
        }
    }

    #[test]
    fn parse_init_rejects_unknown_strategy() {
        let result = Cli::try_parse_from(["lumilio-repo", "init", "r", "--strategy", "tree"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_cleanup_ages() {
        let cli = Cli::parse_from(["lumilio-repo", "cleanup", "r", "--max-age", "2h"]);
        assert_eq!(
            cli.command,
            Commands::Cleanup {
                root: PathBuf::from("r"),
                max_age: Duration::from_secs(2 * 3600),
                temp_max_age: Duration::from_secs(3600),
            }
        );
    }

    #[test]
    fn parse_trash_purge_default_age() {
        let cli = Cli::parse_from(["lumilio-repo", "trash", "purge", "r"]);
        assert_eq!(
            cli.command,
            Commands::Trash {
                action: TrashAction::Purge {
                    root: PathBuf::from("r"),
                    older_than: Duration::from_secs(30 * 86_400),
                },
            }
        );
    }

    #[test]
    fn parse_verbose_is_global() {
        let cli = Cli::parse_from(["lumilio-repo", "validate", "r", "-v"]);
        assert!(cli.verbose);
    }
}
