//! Snapshot naming
//!
//! Names are `backup-` followed by the UTC creation time in ISO-8601 form at
//! millisecond resolution, with `:` and `.` replaced by `-`:
//!
//! ```text
//! 2024-01-15T04:30:00.123Z  ->  backup-2024-01-15T04-30-00-123Z
//! ```
//!
//! Every character position has a fixed width, so byte order of two names is
//! the chronological order of their timestamps.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use std::sync::Arc;

/// Literal prefix shared by every snapshot directory
pub const SNAPSHOT_PREFIX: &str = "backup-";

/// Layout of the timestamp part of a snapshot name
const NAME_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S-%3fZ";

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Generates snapshot names from a clock
#[derive(Clone)]
pub struct SnapshotNamer {
    clock: Arc<dyn Clock>,
}

impl SnapshotNamer {
    /// Namer backed by the wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Namer backed by a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Name for a snapshot taken now
    ///
    /// Two calls in the same millisecond return the same name.
    pub fn next_name(&self) -> String {
        name_at(self.clock.now())
    }
}

impl Default for SnapshotNamer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SnapshotNamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotNamer").finish_non_exhaustive()
    }
}

/// Render the snapshot name for a given instant
pub fn name_at(ts: DateTime<Utc>) -> String {
    let iso = ts.to_rfc3339_opts(SecondsFormat::Millis, true);
    format!("{}{}", SNAPSHOT_PREFIX, iso.replace([':', '.'], "-"))
}

/// Whether a directory entry name follows the snapshot convention
pub fn is_snapshot_name(name: &str) -> bool {
    name.starts_with(SNAPSHOT_PREFIX)
}

/// Recover the creation time encoded in a snapshot name
///
/// Returns `None` for names that match the prefix but were not produced by
/// [`name_at`].
pub fn parse_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let rest = name.strip_prefix(SNAPSHOT_PREFIX)?;
    NaiveDateTime::parse_from_str(rest, NAME_TIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
