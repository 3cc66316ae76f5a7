//! Source trees and backup roots for integration tests

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary source directory plus the roots derived from it
pub struct TestSource {
    temp_dir: TempDir,
    source: PathBuf,
}

impl TestSource {
    /// Create `<tmp>/data` with a few files and a nested directory
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let source = temp_dir.path().join("data");

        fs::create_dir_all(source.join("docs/notes"))?;
        fs::write(source.join("README.md"), "# data\n")?;
        fs::write(source.join("docs/report.txt"), "quarterly numbers\n")?;
        fs::write(source.join("docs/notes/todo.txt"), "water plants\n")?;

        Ok(Self { temp_dir, source })
    }

    /// Working directory for commands
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn source_arg(&self) -> String {
        self.source.to_string_lossy().into_owned()
    }

    pub fn long_term_root(&self) -> PathBuf {
        self.temp_dir.path().join("data_backups")
    }

    pub fn short_term_root(&self) -> PathBuf {
        self.temp_dir.path().join("data_recent_backups")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.long_term_root().join("backup.lock")
    }

    /// Snapshot directory names under `root`, oldest first
    pub fn snapshots(&self, root: &Path) -> Vec<String> {
        let Ok(entries) = fs::read_dir(root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with("backup-"))
            .collect();
        names.sort();
        names
    }

    /// Create an empty snapshot directory with a fixed timestamp
    pub fn seed_snapshot(&self, root: &Path, day: u32) -> Result<String> {
        fs::create_dir_all(root)?;
        let name = format!("backup-2024-01-{:02}T00-00-00-000Z", day);
        fs::create_dir(root.join(&name))?;
        Ok(name)
    }
}
