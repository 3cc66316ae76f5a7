//! Take one snapshot immediately

use crate::config::BackupArgs;
use crate::daemon::BackupService;
use crate::util;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub async fn run(args: &BackupArgs, short_term: bool) -> Result<()> {
    let label = super::selected_label(short_term);
    let service = BackupService::new(args.service_config()?);

    let summary = tokio::task::spawn_blocking(move || service.snapshot_once(label))
        .await
        .context("Snapshot task failed")??;

    println!(
        "{} {} backup {}",
        "✓".green(),
        label,
        summary.snapshot.name.yellow()
    );
    println!(
        "  Copied:      {} files, {} directories, {}",
        summary.snapshot.files,
        summary.snapshot.directories,
        util::format_size(summary.snapshot.bytes)
    );
    if summary.snapshot.skipped > 0 {
        println!(
            "  {}",
            format!("{} special files or links skipped", summary.snapshot.skipped).yellow()
        );
    }
    println!("  Kept:        {}", summary.kept);
    if summary.pruned > 0 {
        println!("  Pruned:      {}", summary.pruned);
    }
    if summary.prune_failures > 0 {
        println!(
            "  {}",
            format!("{} old backups could not be removed", summary.prune_failures).red()
        );
    }

    Ok(())
}
