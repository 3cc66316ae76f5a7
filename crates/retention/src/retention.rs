//! Count-based retention

use crate::listing::{list_snapshots, SnapshotEntry};
use crate::Result;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Retention policy for one destination root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Number of most recent snapshots to keep (0 keeps none)
    pub max_keep: usize,
}

impl RetentionPolicy {
    /// Keep at most `max_keep` snapshots
    pub fn keep(max_keep: usize) -> Self {
        Self { max_keep }
    }

    /// Apply this policy to `root`
    pub fn apply(&self, root: &Path) -> Result<PruneReport> {
        prune(root, self.max_keep)
    }
}

/// A snapshot that could not be deleted
#[derive(Debug)]
pub struct PruneFailure {
    pub path: PathBuf,
    pub error: io::Error,
}

/// Outcome of a prune pass
#[derive(Debug, Default)]
pub struct PruneReport {
    /// Names retained, newest first
    pub kept: Vec<String>,
    /// Names removed
    pub deleted: Vec<String>,
    /// Removals that failed
    pub failed: Vec<PruneFailure>,
}

impl PruneReport {
    /// Whether every excess snapshot was removed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Keep the `max_keep` newest snapshots under `root` and delete the rest
///
/// Only entries carrying the snapshot prefix are considered. Each deletion is
/// attempted independently: a failure is logged and recorded in the report
/// and the remaining excess entries are still removed.
pub fn prune(root: &Path, max_keep: usize) -> Result<PruneReport> {
    prune_with(root, max_keep, remove_entry)
}

fn remove_entry(entry: &SnapshotEntry) -> io::Result<()> {
    if entry.is_dir {
        std::fs::remove_dir_all(&entry.path)
    } else {
        std::fs::remove_file(&entry.path)
    }
}

fn prune_with<F>(root: &Path, max_keep: usize, mut remove: F) -> Result<PruneReport>
where
    F: FnMut(&SnapshotEntry) -> io::Result<()>,
{
    let entries = list_snapshots(root)?;
    let mut report = PruneReport::default();

    if entries.len() <= max_keep {
        debug!(
            root = %root.display(),
            count = entries.len(),
            max_keep,
            "Nothing to prune"
        );
        report.kept = entries.into_iter().map(|e| e.name).collect();
        return Ok(report);
    }

    let mut entries = entries.into_iter();
    report.kept = entries.by_ref().take(max_keep).map(|e| e.name).collect();

    for entry in entries {
        match remove(&entry) {
            Ok(()) => {
                debug!(path = %entry.path.display(), "Removed snapshot");
                report.deleted.push(entry.name);
            }
            Err(error) => {
                warn!(
                    path = %entry.path.display(),
                    error = %error,
                    "Failed to remove snapshot"
                );
                report.failed.push(PruneFailure {
                    path: entry.path,
                    error,
                });
            }
        }
    }

    info!(
        root = %root.display(),
        kept = report.kept.len(),
        deleted = report.deleted.len(),
        failed = report.failed.len(),
        "Pruned snapshots"
    );

    Ok(report)
}
