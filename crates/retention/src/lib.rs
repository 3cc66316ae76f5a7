//! Snapshot listing and retention
//!
//! This crate provides:
//! - Listing of snapshot entries under a destination root (newest first)
//! - Count-based retention pruning with per-entry failure isolation

pub mod listing;
pub mod retention;

// Re-exports
pub use listing::{list_snapshots, SnapshotEntry};
pub use retention::{prune, PruneFailure, PruneReport, RetentionPolicy};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a listing or prune pass before it starts
#[derive(Debug, Error)]
pub enum Error {
    /// The destination root could not be read
    #[error("failed to read snapshot root {path}: {source}")]
    ReadRoot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for retention operations
pub type Result<T> = std::result::Result<T, Error>;
