//! Cron-driven snapshot scheduling
//!
//! This crate provides:
//! - Cron expression parsing with next-fire computation
//! - Schedule records (trigger, destination root, retention limit)
//! - The copy-then-prune cycle run on each fire
//! - The schedule engine: per-schedule tickers, overlap prevention, cycle events

pub mod cron;
pub mod cycle;
pub mod engine;
pub mod schedule;

// Re-exports
pub use cron::{CronExpr, CronParseError};
pub use cycle::{CycleError, CycleRunner, CycleSummary, SnapshotCycle};
pub use engine::{
    CycleEvent, CycleState, EngineError, EngineHandle, ScheduleEngine, ScheduleStatus, Trigger,
    TriggerKind,
};
pub use schedule::{Schedule, ScheduleLabel};
