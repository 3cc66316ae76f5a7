//! andbackup - scheduled snapshots with retention

use anyhow::Result;
use clap::{Parser, Subcommand};
use cli_lib::{cmd, logging, BackupArgs};
use std::path::PathBuf;

/// Periodic full-tree snapshots of a directory with count-based retention
#[derive(Parser)]
#[command(name = "andbackup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the backup service until interrupted
    Start {
        #[command(flatten)]
        args: BackupArgs,
    },
    /// Take one backup now and apply retention
    Snapshot {
        /// Use the short-term schedule
        #[arg(long)]
        short_term: bool,

        #[command(flatten)]
        args: BackupArgs,
    },
    /// Apply retention without taking a backup
    Prune {
        /// Use the short-term schedule
        #[arg(long)]
        short_term: bool,

        #[command(flatten)]
        args: BackupArgs,
    },
    /// List existing backups
    List {
        #[command(flatten)]
        args: BackupArgs,
    },
    /// Show service and backup status
    Status {
        #[command(flatten)]
        args: BackupArgs,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = logging::init_logging(cli.verbose, cli.log_dir.as_deref())?;

    match cli.command {
        Commands::Start { args } => cmd::start::run(&args).await,
        Commands::Snapshot { short_term, args } => cmd::snapshot::run(&args, short_term).await,
        Commands::Prune { short_term, args } => cmd::prune::run(&args, short_term).await,
        Commands::List { args } => cmd::list::run(&args).await,
        Commands::Status { args } => cmd::status::run(&args).await,
    }
}
