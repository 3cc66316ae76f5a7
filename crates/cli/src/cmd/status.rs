//! Show layout and lock status

use crate::config::BackupArgs;
use crate::locks::InstanceLock;
use crate::util;
use anyhow::Result;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use retention::list_snapshots;
use std::path::Path;

pub async fn run(args: &BackupArgs) -> Result<()> {
    let layout = args.layout()?;
    let lock = InstanceLock::new(layout.lock_path());

    println!("{}", "Backup Status".bold());
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!();

    println!("Source:        {}", layout.source().display().to_string().cyan());
    if !layout.source().is_dir() {
        println!("  {}", "Source directory does not exist".yellow());
    }
    println!();

    print!("Service:       ");
    if lock.is_held() {
        println!("{}", "Running ✓".green());
        match lock.holder()? {
            Some(holder) => {
                println!("  PID:         {}", holder.pid);
                let started_ms = i64::try_from(holder.started_at).unwrap_or(i64::MAX);
                if let Some(started) = DateTime::<Utc>::from_timestamp_millis(started_ms) {
                    println!(
                        "  Started:     {} ({})",
                        util::format_relative_time(started),
                        util::format_absolute_time(started).dimmed()
                    );
                }
            }
            None => println!("  {}", "Lock holder unknown".dimmed()),
        }
        println!("  Lock:        {}", lock.path().display());
    } else {
        println!("{}", "Not running".yellow());
        println!("  {}", "Tip: Start with 'andbackup start'".dimmed());
    }
    println!();

    print_root_summary("Long-term:", layout.long_term_root())?;
    print_root_summary("Short-term:", layout.short_term_root())?;

    Ok(())
}

fn print_root_summary(title: &str, root: &Path) -> Result<()> {
    println!("{:<15}{}", title, root.display());
    if !root.is_dir() {
        println!("  {}", "Not created yet".dimmed());
        return Ok(());
    }

    let entries = list_snapshots(root)?;
    println!("  Backups:     {}", entries.len());
    if let Some(latest) = entries.first() {
        let age = latest
            .created
            .map(util::format_relative_time)
            .unwrap_or_else(|| "unknown age".to_string());
        println!("  Latest:      {} ({})", latest.name.yellow(), age.dimmed());
    }
    Ok(())
}
