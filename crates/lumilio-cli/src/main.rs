//! Lumilio repository CLI
//!
//! Operator tooling for repository roots: create, check, repair, ingest and
//! manage the trash.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands, TrashAction};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    execute_command(cli.command)
}

/// Log to stderr so `--json` output stays parseable.
///
/// `--verbose` forces debug level; otherwise `RUST_LOG` is honoured when set.
fn init_tracing(verbose: bool) -> Result<()> {
    let result = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else if std::env::var_os("RUST_LOG").is_some() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        return Ok(());
    };

    result.map_err(|e| CliError::user(format!("Failed to set tracing subscriber: {e}")))?;
    tracing::debug!("Tracing enabled");
    Ok(())
}

fn execute_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init {
            path,
            name,
            strategy,
            duplicates,
        } => commands::run_init(&path, name.as_deref(), strategy, duplicates),
        Commands::Validate { path, json } => commands::run_validate(&path, json),
        Commands::Repair { path } => commands::run_repair(&path),
        Commands::Ingest { root, file, hash } => {
            commands::run_ingest(&root, &file, hash.as_deref())
        }
        Commands::Resolve {
            root,
            filename,
            hash,
        } => commands::run_resolve(&root, &filename, hash.as_deref()),
        Commands::Cleanup {
            root,
            max_age,
            temp_max_age,
        } => commands::run_cleanup(&root, max_age, temp_max_age),
        Commands::Trash { action } => cmd_trash(action),
    }
}

fn cmd_trash(action: TrashAction) -> Result<()> {
    match action {
        TrashAction::List { root, json } => commands::run_trash_list(&root, json),
        TrashAction::Move {
            root,
            path,
            reason,
            asset_id,
            user_id,
        } => commands::run_trash_move(&root, &path, reason, asset_id, user_id),
        TrashAction::Recover { root, id } => commands::run_trash_recover(&root, &id),
        TrashAction::Purge { root, older_than } => commands::run_trash_purge(&root, older_than),
    }
}
