//! Apply retention without taking a snapshot

use crate::config::BackupArgs;
use crate::daemon::BackupService;
use anyhow::{Context, Result};
use owo_colors::OwoColorize;

pub async fn run(args: &BackupArgs, short_term: bool) -> Result<()> {
    let label = super::selected_label(short_term);
    let service = BackupService::new(args.service_config()?);

    let report = tokio::task::spawn_blocking(move || service.prune_once(label))
        .await
        .context("Prune task failed")??;

    if report.deleted.is_empty() && report.is_clean() {
        println!("{}", format!("Nothing to prune ({} {} backups)", report.kept.len(), label).dimmed());
        return Ok(());
    }

    for name in &report.deleted {
        println!("{} {}", "removed".red(), name);
    }
    for failure in &report.failed {
        println!(
            "{} {}: {}",
            "failed".red().bold(),
            failure.path.display(),
            failure.error
        );
    }
    println!(
        "Kept {} {} backups, removed {}",
        report.kept.len(),
        label,
        report.deleted.len()
    );

    if !report.is_clean() {
        anyhow::bail!("{} backups could not be removed", report.failed.len());
    }
    Ok(())
}
