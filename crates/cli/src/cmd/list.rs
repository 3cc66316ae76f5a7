//! List snapshots in both destination roots

use crate::config::BackupArgs;
use crate::util;
use anyhow::Result;
use owo_colors::OwoColorize;
use retention::list_snapshots;
use std::path::Path;

pub async fn run(args: &BackupArgs) -> Result<()> {
    let layout = args.layout()?;

    print_root("Long-term backups", layout.long_term_root())?;
    println!();
    print_root("Short-term backups", layout.short_term_root())?;

    Ok(())
}

fn print_root(title: &str, root: &Path) -> Result<()> {
    println!("{} {}", title.bold(), root.display().to_string().dimmed());

    if !root.is_dir() {
        println!("  {}", "Directory does not exist".dimmed());
        return Ok(());
    }

    let entries = list_snapshots(root)?;
    if entries.is_empty() {
        println!("  {}", "No backups yet".dimmed());
        return Ok(());
    }

    for entry in &entries {
        let age = entry
            .created
            .map(util::format_relative_time)
            .unwrap_or_else(|| "unknown age".to_string());
        println!(
            "  {}  {:>12}  {}",
            entry.name.yellow(),
            size_label(&entry.path),
            age.dimmed()
        );
    }
    println!("  {} total", entries.len());

    Ok(())
}

/// Human-readable size, or "size unknown" if the tree cannot be read
fn size_label(path: &Path) -> String {
    match util::calculate_dir_size(path) {
        Ok(size) => util::format_size(size),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to measure backup size");
            "size unknown".to_string()
        }
    }
}
