//! Instance lock for service exclusivity
//!
//! The lock is a marker file created with `create_new`, so acquiring never
//! overwrites an existing marker. It is advisory: a marker left behind by a
//! crashed instance is not detected and must be removed by hand.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Instance lock marker
#[derive(Debug, Clone)]
pub struct InstanceLock {
    path: PathBuf,
}

/// Lock file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub pid: u32,
    pub started_at: u64,
}

impl InstanceLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Try to create the marker exclusively
    ///
    /// Returns `Ok(false)` if the marker already exists. Any other failure
    /// to create it is an error.
    pub fn acquire(&self) -> Result<bool> {
        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::error!(
                    path = %self.path.display(),
                    "Lock file already exists, indicating another instance is running"
                );
                return Ok(false);
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to create lock file {}", self.path.display())
                })
            }
        };

        // The marker alone is the lock; its content is informational
        if let Err(e) = Self::write_holder(&mut file) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to record lock holder");
        }

        tracing::debug!(path = %self.path.display(), "Acquired instance lock");
        Ok(true)
    }

    /// Remove the marker, tolerating its absence
    pub fn release(&self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Released instance lock"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Lock file already removed");
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to release lock");
            }
        }
    }

    /// Whether the marker currently exists
    pub fn is_held(&self) -> bool {
        self.path.exists()
    }

    /// Read who holds the lock
    ///
    /// `None` if the marker is absent or carries no readable holder record.
    pub fn holder(&self) -> Result<Option<LockHolder>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read lock file {}", self.path.display()))
            }
        };
        Ok(serde_json::from_str(&contents).ok())
    }

    /// Write lock content (PID + timestamp)
    fn write_holder(file: &mut std::fs::File) -> Result<()> {
        let holder = LockHolder {
            pid: std::process::id(),
            started_at: current_timestamp_ms(),
        };

        let serialized =
            serde_json::to_string(&holder).context("Failed to serialize lock content")?;
        file.write_all(serialized.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}

/// Get current timestamp in milliseconds
fn current_timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
