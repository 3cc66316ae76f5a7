//! On-disk layout derived from the source path
//!
//! ```text
//! <source>_backups/
//!   backup.lock
//!   backup-2024-01-15T04-30-00-123Z/
//!   ...
//! <source>_recent_backups/
//!   backup-2024-01-15T04-45-00-001Z/
//!   ...
//! ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Name of the instance lock marker inside the long-term root
pub const LOCK_FILE_NAME: &str = "backup.lock";

/// Paths used by a backup service for one source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupLayout {
    source: PathBuf,
    long_term_root: PathBuf,
    short_term_root: PathBuf,
}

impl BackupLayout {
    /// Derive the layout for a source directory
    ///
    /// A trailing separator on `source` is ignored, so `/data/` and `/data`
    /// both map to `/data_backups`.
    pub fn for_source(source: &Path) -> Self {
        let source: PathBuf = source.components().collect();
        Self {
            long_term_root: suffixed(&source, "_backups"),
            short_term_root: suffixed(&source, "_recent_backups"),
            source,
        }
    }

    /// Source tree being backed up
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Root for long-term snapshots (also holds the lock)
    pub fn long_term_root(&self) -> &Path {
        &self.long_term_root
    }

    /// Root for short-term snapshots
    pub fn short_term_root(&self) -> &Path {
        &self.short_term_root
    }

    /// Path of the instance lock marker
    pub fn lock_path(&self) -> PathBuf {
        self.long_term_root.join(LOCK_FILE_NAME)
    }

    /// Create both destination roots if missing
    pub fn ensure_roots(&self) -> crate::Result<()> {
        for root in [&self.long_term_root, &self.short_term_root] {
            std::fs::create_dir_all(root).map_err(|e| crate::Error::io(root, e))?;
        }
        Ok(())
    }
}

fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}
