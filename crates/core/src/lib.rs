//! Snapshot primitives for andbackup
//!
//! This crate provides:
//! - Snapshot naming (timestamp-derived, lexicographically sortable)
//! - Full-tree snapshot copying
//! - The on-disk backup layout derived from a source path

pub mod copy;
pub mod layout;
pub mod naming;

use std::path::PathBuf;
use thiserror::Error;

// Re-exports
pub use copy::{SnapshotCopier, SnapshotInfo};
pub use layout::{BackupLayout, LOCK_FILE_NAME};
pub use naming::{Clock, SnapshotNamer, SystemClock, SNAPSHOT_PREFIX};

/// Errors produced while taking a snapshot
#[derive(Debug, Error)]
pub enum Error {
    /// The source tree does not exist
    #[error("source directory does not exist: {0}")]
    SourceMissing(PathBuf),

    /// The source exists but is not a directory
    #[error("source is not a directory: {0}")]
    SourceNotDirectory(PathBuf),

    /// A snapshot with the generated name is already present
    #[error("snapshot already exists: {0}")]
    SnapshotExists(PathBuf),

    /// Filesystem failure on a specific path
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, Error>;
