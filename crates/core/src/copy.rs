//! Full-tree snapshot copy
//!
//! Preservation rules:
//! - regular files: contents copied, Unix permission bits carried over
//! - directories: recreated with default permissions
//! - symlinks: never followed; recreated with the same target on Unix,
//!   skipped with a warning elsewhere
//! - FIFOs, sockets and device nodes: skipped with a warning, never opened
//! - timestamps: not preserved
//!
//! A failed copy removes its partial snapshot directory, so a failed cycle
//! leaves nothing behind under the destination root.

use crate::naming::SnapshotNamer;
use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Summary of a completed snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotInfo {
    /// Directory name under the destination root
    pub name: String,
    /// Full path of the snapshot directory
    pub path: PathBuf,
    /// Regular files copied
    pub files: u64,
    /// Directories created below the snapshot root
    pub directories: u64,
    /// Symbolic links recreated
    pub symlinks: u64,
    /// Entries left out (special files, and symlinks off Unix)
    pub skipped: u64,
    /// Bytes of file content copied
    pub bytes: u64,
}

/// Copies a source tree into freshly named snapshot directories
#[derive(Debug, Clone, Default)]
pub struct SnapshotCopier {
    namer: SnapshotNamer,
}

impl SnapshotCopier {
    /// Create a copier using the given namer
    pub fn new(namer: SnapshotNamer) -> Self {
        Self { namer }
    }

    /// Copy `source` into a new snapshot directly under `destination_root`
    ///
    /// Fails without touching `destination_root` if the source is missing or
    /// not a directory, or if the generated name already exists.
    pub fn copy(&self, source: &Path, destination_root: &Path) -> Result<SnapshotInfo> {
        match fs::metadata(source) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(Error::SourceNotDirectory(source.to_path_buf())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(Error::SourceMissing(source.to_path_buf()))
            }
            Err(e) => return Err(Error::io(source, e)),
        }

        let name = self.namer.next_name();
        let snapshot_path = destination_root.join(&name);

        if let Err(e) = fs::create_dir(&snapshot_path) {
            return Err(match e.kind() {
                io::ErrorKind::AlreadyExists => Error::SnapshotExists(snapshot_path),
                _ => Error::io(&snapshot_path, e),
            });
        }

        let mut info = SnapshotInfo {
            name,
            path: snapshot_path.clone(),
            ..Default::default()
        };

        match copy_tree(source, &snapshot_path, &mut info) {
            Ok(()) => {
                debug!(
                    snapshot = %snapshot_path.display(),
                    files = info.files,
                    bytes = info.bytes,
                    "Snapshot copied"
                );
                Ok(info)
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&snapshot_path) {
                    warn!(
                        snapshot = %snapshot_path.display(),
                        error = %cleanup,
                        "Failed to remove partial snapshot"
                    );
                }
                Err(e)
            }
        }
    }
}

/// Walk `source` and mirror every entry below `target`
fn copy_tree(source: &Path, target: &Path, info: &mut SnapshotInfo) -> Result<()> {
    // The snapshot itself may live inside the source tree
    let walker = WalkDir::new(source)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| entry.path() != target);

    for entry in walker {
        let entry = entry.map_err(|e| walk_error(source, e))?;
        let relative = entry.path().strip_prefix(source).map_err(|_| {
            Error::io(
                entry.path(),
                io::Error::new(io::ErrorKind::InvalidInput, "entry outside source tree"),
            )
        })?;
        let dest = target.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir(&dest).map_err(|e| Error::io(&dest, e))?;
            info.directories += 1;
        } else if file_type.is_symlink() {
            if copy_symlink(entry.path(), &dest)? {
                info.symlinks += 1;
            } else {
                info.skipped += 1;
            }
        } else if file_type.is_file() {
            let bytes = fs::copy(entry.path(), &dest).map_err(|e| Error::io(entry.path(), e))?;
            info.files += 1;
            info.bytes += bytes;
        } else {
            // Opening a FIFO would block until a writer shows up
            warn!(path = %entry.path().display(), "Skipping special file");
            info.skipped += 1;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn copy_symlink(link: &Path, dest: &Path) -> Result<bool> {
    let target = fs::read_link(link).map_err(|e| Error::io(link, e))?;
    std::os::unix::fs::symlink(&target, dest).map_err(|e| Error::io(dest, e))?;
    Ok(true)
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _dest: &Path) -> Result<bool> {
    warn!(path = %link.display(), "Skipping symbolic link");
    Ok(false)
}

fn walk_error(source: &Path, err: walkdir::Error) -> Error {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| source.to_path_buf());
    let io_err = err
        .into_io_error()
        .unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, "filesystem loop detected"));
    Error::Io {
        path,
        source: io_err,
    }
}
