//! CLI command implementations

pub mod list;
pub mod prune;
pub mod snapshot;
pub mod start;
pub mod status;

use scheduler::ScheduleLabel;

/// Schedule selected by a `--short-term` flag
pub(crate) fn selected_label(short_term: bool) -> ScheduleLabel {
    if short_term {
        ScheduleLabel::ShortTerm
    } else {
        ScheduleLabel::LongTerm
    }
}
