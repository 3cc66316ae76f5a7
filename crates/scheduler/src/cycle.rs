//! One snapshot cycle: copy, then prune

use crate::schedule::Schedule;
use backup_core::{SnapshotCopier, SnapshotInfo, SnapshotNamer};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors that end a cycle early
#[derive(Debug, Error)]
pub enum CycleError {
    #[error("snapshot copy failed: {0}")]
    Copy(#[from] backup_core::Error),

    #[error("pruning failed: {0}")]
    Prune(#[from] retention::Error),

    #[error("cycle task panicked")]
    Panicked,
}

/// What a successful cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// The snapshot taken this cycle
    pub snapshot: SnapshotInfo,
    /// Snapshots kept after pruning
    pub kept: usize,
    /// Snapshots removed by pruning
    pub pruned: usize,
    /// Removals that failed (already logged by the pruner)
    pub prune_failures: usize,
}

/// Work performed each time a schedule fires
///
/// Runs on the blocking thread pool.
pub trait CycleRunner: Send + Sync + 'static {
    fn run_cycle(&self, schedule: &Schedule) -> Result<CycleSummary, CycleError>;
}

/// Copies the source tree into the schedule's root, then applies retention
#[derive(Debug, Clone)]
pub struct SnapshotCycle {
    source: PathBuf,
    copier: SnapshotCopier,
}

impl SnapshotCycle {
    pub fn new(source: impl Into<PathBuf>, namer: SnapshotNamer) -> Self {
        Self {
            source: source.into(),
            copier: SnapshotCopier::new(namer),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl CycleRunner for SnapshotCycle {
    fn run_cycle(&self, schedule: &Schedule) -> Result<CycleSummary, CycleError> {
        // A failed copy returns here, so nothing is pruned this cycle
        let snapshot = self.copier.copy(&self.source, schedule.destination())?;
        info!(
            schedule = %schedule.label(),
            snapshot = %snapshot.path.display(),
            files = snapshot.files,
            "Backup created"
        );

        let report = retention::prune(schedule.destination(), schedule.retention())?;

        Ok(CycleSummary {
            snapshot,
            kept: report.kept.len(),
            pruned: report.deleted.len(),
            prune_failures: report.failed.len(),
        })
    }
}
