//! Cron expression parsing and evaluation.
//!
//! Supports standard 5-field expressions and a 6-field form with a leading
//! seconds field:
//! ```text
//! ┌───────────── second (0-59, optional)
//! │ ┌───────────── minute (0-59)
//! │ │ ┌───────────── hour (0-23)
//! │ │ │ ┌───────────── day of month (1-31)
//! │ │ │ │ ┌───────────── month (1-12 or jan-dec)
//! │ │ │ │ │ ┌───────────── day of week (0-7 or sun-sat, 0 and 7 = Sunday)
//! │ │ │ │ │ │
//! * * * * * *
//! ```
//!
//! Every field must match for a time to fire; day of month and day of week
//! are combined with AND.

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How far ahead [`CronExpr::next_after`] searches before giving up.
///
/// One full Gregorian cycle (400 years): the calendar repeats after that, so
/// an expression with no match inside the window never matches at all.
const LOOKAHEAD_DAYS: i64 = 146_097;

/// Upper bound on local-time candidates rejected by DST transitions.
const MAX_LOCAL_CANDIDATES: usize = 10_000;

/// Errors that can occur when parsing cron expressions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CronParseError {
    #[error("Invalid cron expression: expected 5 or 6 fields, got {0}")]
    InvalidFieldCount(usize),
    #[error("Invalid {field} field '{part}': {reason}")]
    InvalidField {
        field: &'static str,
        part: String,
        reason: String,
    },
    #[error("Value {value} is out of range [{min}, {max}] for {field}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    #[error("Invalid range: {0}-{1}")]
    InvalidRange(u32, u32),
    #[error("Invalid step value: {0}")]
    InvalidStep(String),
    #[error("Cron expression '{0}' never fires")]
    NeverFires(String),
}

/// Static description of one cron field.
struct FieldSpec {
    label: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    first_name_value: u32,
}

const SECOND: FieldSpec = FieldSpec {
    label: "second",
    min: 0,
    max: 59,
    names: &[],
    first_name_value: 0,
};

const MINUTE: FieldSpec = FieldSpec {
    label: "minute",
    min: 0,
    max: 59,
    names: &[],
    first_name_value: 0,
};

const HOUR: FieldSpec = FieldSpec {
    label: "hour",
    min: 0,
    max: 23,
    names: &[],
    first_name_value: 0,
};

const DAY_OF_MONTH: FieldSpec = FieldSpec {
    label: "day-of-month",
    min: 1,
    max: 31,
    names: &[],
    first_name_value: 0,
};

const MONTH: FieldSpec = FieldSpec {
    label: "month",
    min: 1,
    max: 12,
    names: &[
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ],
    first_name_value: 1,
};

// 7 is accepted as an alias for Sunday and folded to 0 after parsing
const DAY_OF_WEEK: FieldSpec = FieldSpec {
    label: "day-of-week",
    min: 0,
    max: 7,
    names: &["sun", "mon", "tue", "wed", "thu", "fri", "sat"],
    first_name_value: 0,
};

/// A single field in a cron expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronField {
    /// The set of valid values for this field.
    pub values: BTreeSet<u32>,
}

impl CronField {
    fn parse(expr: &str, spec: &FieldSpec) -> Result<Self, CronParseError> {
        let mut field = Self {
            values: BTreeSet::new(),
        };
        for part in expr.split(',') {
            field.parse_part(part.trim(), spec)?;
        }
        Ok(field)
    }

    fn parse_part(&mut self, part: &str, spec: &FieldSpec) -> Result<(), CronParseError> {
        let invalid = |reason: &str| CronParseError::InvalidField {
            field: spec.label,
            part: part.to_string(),
            reason: reason.to_string(),
        };

        if part.is_empty() {
            return Err(invalid("empty list element"));
        }

        // Handle step values (e.g., */5, 0-30/5, 10/15)
        let (range_part, step) = match part.split_once('/') {
            Some((range, step_str)) => {
                let step = step_str
                    .parse::<u32>()
                    .map_err(|_| CronParseError::InvalidStep(step_str.to_string()))?;
                if step == 0 || step > spec.max {
                    return Err(CronParseError::InvalidStep(step_str.to_string()));
                }
                (range, Some(step))
            }
            None => (part, None),
        };

        let (start, end) = if range_part == "*" {
            (spec.min, spec.max)
        } else if let Some((lo, hi)) = range_part.split_once('-') {
            let start = parse_value(lo, spec).ok_or_else(|| invalid("invalid start of range"))?;
            let end = parse_value(hi, spec).ok_or_else(|| invalid("invalid end of range"))?;
            if start > end {
                return Err(CronParseError::InvalidRange(start, end));
            }
            (start, end)
        } else {
            let value = parse_value(range_part, spec).ok_or_else(|| invalid("invalid value"))?;
            // A bare start with a step runs to the end of the field
            match step {
                Some(_) => (value, spec.max),
                None => (value, value),
            }
        };

        if start < spec.min || end > spec.max {
            return Err(CronParseError::OutOfRange {
                field: spec.label,
                value: if start < spec.min { start } else { end },
                min: spec.min,
                max: spec.max,
            });
        }

        let step = step.unwrap_or(1);
        let mut value = start;
        while value <= end {
            self.values.insert(value);
            match value.checked_add(step) {
                Some(next) => value = next,
                None => break,
            }
        }

        Ok(())
    }

    /// Check if a value matches this field.
    pub fn matches(&self, value: u32) -> bool {
        self.values.contains(&value)
    }

    /// Get the next matching value >= given value.
    pub fn next(&self, value: u32) -> Option<u32> {
        self.values.range(value..).next().copied()
    }

    /// Get the first matching value.
    pub fn first(&self) -> Option<u32> {
        self.values.iter().next().copied()
    }
}

fn parse_value(token: &str, spec: &FieldSpec) -> Option<u32> {
    if let Ok(value) = token.parse::<u32>() {
        return Some(value);
    }
    let lower = token.to_ascii_lowercase();
    spec.names
        .iter()
        .position(|name| *name == lower)
        .map(|idx| idx as u32 + spec.first_name_value)
}

/// A parsed cron expression.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CronExpr {
    /// Original expression string.
    expr: String,
    /// Second field (fixed at 0 for 5-field expressions).
    pub second: CronField,
    /// Minute field (0-59).
    pub minute: CronField,
    /// Hour field (0-23).
    pub hour: CronField,
    /// Day of month field (1-31).
    pub day_of_month: CronField,
    /// Month field (1-12).
    pub month: CronField,
    /// Day of week field (0-6, 0 = Sunday).
    pub day_of_week: CronField,
}

impl CronExpr {
    /// Parse a cron expression string.
    ///
    /// Expressions that can never fire (such as
    /// `0 0 30 2 *`) are rejected.
    pub fn parse(expr: &str) -> Result<Self, CronParseError> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        let (second, rest) = match parts.len() {
            5 => (
                CronField {
                    values: BTreeSet::from([0]),
                },
                &parts[..],
            ),
            6 => (CronField::parse(parts[0], &SECOND)?, &parts[1..]),
            n => return Err(CronParseError::InvalidFieldCount(n)),
        };

        let mut day_of_week = CronField::parse(rest[4], &DAY_OF_WEEK)?;
        if day_of_week.values.remove(&7) {
            day_of_week.values.insert(0);
        }

        let parsed = Self {
            expr: parts.join(" "),
            second,
            minute: CronField::parse(rest[0], &MINUTE)?,
            hour: CronField::parse(rest[1], &HOUR)?,
            day_of_month: CronField::parse(rest[2], &DAY_OF_MONTH)?,
            month: CronField::parse(rest[3], &MONTH)?,
            day_of_week,
        };

        if parsed.next_after(Utc::now().naive_utc()).is_none() {
            return Err(CronParseError::NeverFires(parsed.expr));
        }

        Ok(parsed)
    }

    /// The expression as written (whitespace normalized).
    pub fn as_str(&self) -> &str {
        &self.expr
    }

    /// Check if a wall-clock time matches this expression.
    pub fn matches(&self, dt: &NaiveDateTime) -> bool {
        self.date_matches(dt.date())
            && self.hour.matches(dt.hour())
            && self.minute.matches(dt.minute())
            && self.second.matches(dt.second())
    }

    fn date_matches(&self, date: NaiveDate) -> bool {
        self.day_of_month.matches(date.day())
            && self.month.matches(date.month())
            && self.day_of_week.matches(date.weekday().num_days_from_sunday())
    }

    /// First matching wall-clock time strictly after `after`.
    pub fn next_after(&self, after: NaiveDateTime) -> Option<NaiveDateTime> {
        let limit = after + Duration::days(LOOKAHEAD_DAYS);
        let mut current = after.with_nanosecond(0)? + Duration::seconds(1);

        while current <= limit {
            let date = current.date();

            if !self.date_matches(date) {
                current = start_of_next_day(date)?;
                continue;
            }

            if !self.hour.matches(current.hour()) {
                current = match self.hour.next(current.hour() + 1) {
                    Some(hour) => date.and_hms_opt(hour, 0, 0)?,
                    None => start_of_next_day(date)?,
                };
                continue;
            }

            if !self.minute.matches(current.minute()) {
                current = match self.minute.next(current.minute() + 1) {
                    Some(minute) => date.and_hms_opt(current.hour(), minute, 0)?,
                    None => date.and_hms_opt(current.hour(), 0, 0)? + Duration::hours(1),
                };
                continue;
            }

            match self.second.next(current.second()) {
                Some(second) => return current.with_second(second),
                None => {
                    current = current.with_second(0)? + Duration::minutes(1);
                }
            }
        }

        None
    }

    /// Next firing instant strictly after `now`, evaluated in `now`'s zone.
    ///
    /// Wall-clock times skipped by a DST gap are passed over; ambiguous times
    /// fire at their earliest occurrence that is still in the future.
    pub fn next_fire<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        let tz = now.timezone();
        let mut cursor = now.naive_local();

        for _ in 0..MAX_LOCAL_CANDIDATES {
            let candidate = self.next_after(cursor)?;
            let occurrences = match tz.from_local_datetime(&candidate) {
                LocalResult::Single(dt) => [Some(dt), None],
                LocalResult::Ambiguous(earliest, latest) => [Some(earliest), Some(latest)],
                LocalResult::None => [None, None],
            };
            let found = occurrences.into_iter().flatten().find(|dt| dt > now);
            if found.is_some() {
                return found;
            }
            cursor = candidate;
        }

        None
    }
}

fn start_of_next_day(date: NaiveDate) -> Option<NaiveDateTime> {
    date.succ_opt()?.and_hms_opt(0, 0, 0)
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expr)
    }
}

impl FromStr for CronExpr {
    type Err = CronParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CronExpr::parse(s)
    }
}

impl TryFrom<String> for CronExpr {
    type Error = CronParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CronExpr::parse(&value)
    }
}

impl From<CronExpr> for String {
    fn from(expr: CronExpr) -> Self {
        expr.expr
    }
}
