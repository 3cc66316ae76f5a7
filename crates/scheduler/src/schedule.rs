//! Schedule records

use crate::cron::CronExpr;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Which retention tier a schedule feeds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleLabel {
    ShortTerm,
    LongTerm,
}

impl ScheduleLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScheduleLabel::ShortTerm => "short-term",
            ScheduleLabel::LongTerm => "long-term",
        }
    }
}

impl fmt::Display for ScheduleLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A recurring snapshot schedule
///
/// Immutable once registered with the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    label: ScheduleLabel,
    trigger: CronExpr,
    destination: PathBuf,
    retention: usize,
}

impl Schedule {
    pub fn new(
        label: ScheduleLabel,
        trigger: CronExpr,
        destination: impl Into<PathBuf>,
        retention: usize,
    ) -> Self {
        Self {
            label,
            trigger,
            destination: destination.into(),
            retention,
        }
    }

    pub fn label(&self) -> ScheduleLabel {
        self.label
    }

    pub fn trigger(&self) -> &CronExpr {
        &self.trigger
    }

    /// Destination root holding this schedule's snapshots
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Maximum number of snapshots kept under the destination root
    pub fn retention(&self) -> usize {
        self.retention
    }
}
