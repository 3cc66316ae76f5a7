//! Snapshot discovery under a destination root

use crate::{Error, Result};
use backup_core::naming::{is_snapshot_name, parse_timestamp};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// One entry under a destination root that follows the snapshot convention
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    /// Entry name (also its identity)
    pub name: String,
    /// Full path
    pub path: PathBuf,
    /// Whether the entry is a real directory (symlinks are not followed)
    pub is_dir: bool,
    /// Creation time decoded from the name, if it parses
    pub created: Option<DateTime<Utc>>,
}

/// List snapshot entries under `root`, newest first
///
/// Entries whose names lack the snapshot prefix are ignored. Name order is
/// chronological order, so sorting by name descending yields newest first.
pub fn list_snapshots(root: &Path) -> Result<Vec<SnapshotEntry>> {
    let read_err = |source| Error::ReadRoot {
        path: root.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for dir_entry in std::fs::read_dir(root).map_err(read_err)? {
        let dir_entry = dir_entry.map_err(read_err)?;
        let name = dir_entry.file_name().to_string_lossy().into_owned();
        if !is_snapshot_name(&name) {
            continue;
        }

        let is_dir = dir_entry
            .file_type()
            .map(|ft| ft.is_dir())
            .map_err(read_err)?;

        entries.push(SnapshotEntry {
            created: parse_timestamp(&name),
            path: dir_entry.path(),
            name,
            is_dir,
        });
    }

    entries.sort_by(|a, b| b.name.cmp(&a.name));
    Ok(entries)
}
