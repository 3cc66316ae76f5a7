//! Schedule engine for periodic snapshot cycles.
//!
//! Each registered schedule gets a ticker task that sleeps until the next
//! cron match and then delivers a [`Trigger`] message to the engine loop.
//! The loop owns the per-schedule state: an idle schedule starts a cycle on
//! the blocking pool, a busy one drops the trigger and reports it as skipped.
//! Schedules never wait on each other.

use crate::cycle::{CycleError, CycleRunner, CycleSummary};
use crate::schedule::{Schedule, ScheduleLabel};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Capacity of the trigger queue shared by all tickers and handles.
const TRIGGER_QUEUE_DEPTH: usize = 64;

/// Capacity of the cycle event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Errors surfaced by the engine API.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("a {0} schedule is already registered")]
    DuplicateSchedule(ScheduleLabel),
    #[error("schedule engine has stopped")]
    Stopped,
}

/// Where a trigger came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// The schedule's cron expression matched.
    Timer,
    /// Requested through an [`EngineHandle`].
    Manual,
}

/// Request to run one cycle of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub label: ScheduleLabel,
    pub kind: TriggerKind,
}

/// Observable outcome of trigger handling.
#[derive(Debug, Clone)]
pub enum CycleEvent {
    /// A cycle started.
    Started { label: ScheduleLabel },
    /// A cycle finished its copy and prune.
    Completed {
        label: ScheduleLabel,
        summary: CycleSummary,
        duration: Duration,
    },
    /// A cycle failed; the schedule stays armed.
    Failed { label: ScheduleLabel, error: String },
    /// A trigger arrived while the previous cycle was still running.
    Skipped { label: ScheduleLabel },
}

/// Current state of a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleState {
    Idle,
    Running,
}

/// Per-schedule bookkeeping, readable through [`EngineHandle::status`].
#[derive(Debug, Clone)]
pub struct ScheduleStatus {
    pub state: CycleState,
    pub next_fire: Option<DateTime<Local>>,
    pub completed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub last_snapshot: Option<String>,
    pub last_error: Option<String>,
}

impl Default for ScheduleStatus {
    fn default() -> Self {
        Self {
            state: CycleState::Idle,
            next_fire: None,
            completed: 0,
            failed: 0,
            skipped: 0,
            last_snapshot: None,
            last_error: None,
        }
    }
}

type StatusTable = Arc<Mutex<HashMap<ScheduleLabel, ScheduleStatus>>>;

/// Cloneable handle for interacting with a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    trigger_tx: mpsc::Sender<Trigger>,
    status: StatusTable,
}

impl EngineHandle {
    /// Ask the engine to run a cycle of `label` now.
    ///
    /// Subject to the same overlap rule as timer triggers.
    pub async fn trigger(&self, label: ScheduleLabel) -> Result<(), EngineError> {
        self.trigger_tx
            .send(Trigger {
                label,
                kind: TriggerKind::Manual,
            })
            .await
            .map_err(|_| EngineError::Stopped)
    }

    /// Snapshot of a schedule's bookkeeping.
    pub fn status(&self, label: ScheduleLabel) -> Option<ScheduleStatus> {
        self.status.lock().get(&label).cloned()
    }
}

/// Owns the registered schedules and runs their cycles.
pub struct ScheduleEngine {
    runner: Arc<dyn CycleRunner>,
    schedules: Vec<Arc<Schedule>>,
    trigger_tx: mpsc::Sender<Trigger>,
    trigger_rx: mpsc::Receiver<Trigger>,
    events: broadcast::Sender<CycleEvent>,
    status: StatusTable,
}

impl ScheduleEngine {
    /// Create an engine whose cycles are executed by `runner`.
    pub fn new(runner: Arc<dyn CycleRunner>) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_QUEUE_DEPTH);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            runner,
            schedules: Vec::new(),
            trigger_tx,
            trigger_rx,
            events,
            status: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a schedule. At most one schedule per label.
    pub fn register(&mut self, schedule: Schedule) -> Result<(), EngineError> {
        let label = schedule.label();
        if self.schedules.iter().any(|s| s.label() == label) {
            return Err(EngineError::DuplicateSchedule(label));
        }

        info!(
            schedule = %label,
            trigger = %schedule.trigger(),
            destination = %schedule.destination().display(),
            retention = schedule.retention(),
            "Registered schedule"
        );

        self.status.lock().insert(label, ScheduleStatus::default());
        self.schedules.push(Arc::new(schedule));
        Ok(())
    }

    /// Registered schedules, in registration order.
    pub fn schedules(&self) -> impl Iterator<Item = &Schedule> {
        self.schedules.iter().map(|s| s.as_ref())
    }

    /// Handle for manual triggers and status queries.
    pub fn handle(&self) -> EngineHandle {
        EngineHandle {
            trigger_tx: self.trigger_tx.clone(),
            status: self.status.clone(),
        }
    }

    /// Subscribe to cycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.events.subscribe()
    }

    /// Run until `shutdown` resolves.
    ///
    /// On shutdown no further triggers are accepted; cycles already running
    /// are awaited before this returns.
    pub async fn run<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let ScheduleEngine {
            runner,
            schedules,
            trigger_tx,
            mut trigger_rx,
            events,
            status,
        } = self;

        let mut tickers = JoinSet::new();
        for schedule in &schedules {
            tickers.spawn(run_ticker(
                schedule.clone(),
                trigger_tx.clone(),
                status.clone(),
            ));
        }
        drop(trigger_tx);

        let by_label: HashMap<ScheduleLabel, Arc<Schedule>> =
            schedules.iter().map(|s| (s.label(), s.clone())).collect();
        let mut cycles = JoinSet::new();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                Some(trigger) = trigger_rx.recv() => {
                    let Some(schedule) = by_label.get(&trigger.label) else {
                        warn!(schedule = %trigger.label, "Trigger for unregistered schedule ignored");
                        continue;
                    };
                    debug!(schedule = %trigger.label, kind = ?trigger.kind, "Trigger received");
                    if !try_start(&status, trigger.label) {
                        warn!(schedule = %trigger.label, "Previous cycle still running, skipping trigger");
                        let _ = events.send(CycleEvent::Skipped { label: trigger.label });
                        continue;
                    }
                    cycles.spawn(run_cycle(
                        runner.clone(),
                        schedule.clone(),
                        events.clone(),
                        status.clone(),
                    ));
                }
                Some(joined) = cycles.join_next(), if !cycles.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Cycle task aborted");
                    }
                }
            }
        }

        info!("Schedule engine stopping");
        trigger_rx.close();
        tickers.shutdown().await;

        if !cycles.is_empty() {
            info!(in_flight = cycles.len(), "Waiting for running backup cycles");
        }
        while let Some(joined) = cycles.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Cycle task aborted");
            }
        }
        info!("Schedule engine stopped");
    }
}

/// Mark a schedule running; false if it already was.
fn try_start(status: &StatusTable, label: ScheduleLabel) -> bool {
    let mut table = status.lock();
    let entry = table.entry(label).or_default();
    if entry.state == CycleState::Running {
        entry.skipped += 1;
        return false;
    }
    entry.state = CycleState::Running;
    true
}

async fn run_cycle(
    runner: Arc<dyn CycleRunner>,
    schedule: Arc<Schedule>,
    events: broadcast::Sender<CycleEvent>,
    status: StatusTable,
) {
    let label = schedule.label();
    let _ = events.send(CycleEvent::Started { label });
    let started = Instant::now();

    let result = tokio::task::spawn_blocking(move || runner.run_cycle(&schedule))
        .await
        .unwrap_or(Err(CycleError::Panicked));
    let duration = started.elapsed();

    let event = {
        let mut table = status.lock();
        let entry = table.entry(label).or_default();
        entry.state = CycleState::Idle;

        match result {
            Ok(summary) => {
                info!(
                    schedule = %label,
                    snapshot = %summary.snapshot.name,
                    kept = summary.kept,
                    pruned = summary.pruned,
                    elapsed_ms = duration.as_millis() as u64,
                    "Backup cycle completed"
                );
                entry.completed += 1;
                entry.last_snapshot = Some(summary.snapshot.name.clone());
                CycleEvent::Completed {
                    label,
                    summary,
                    duration,
                }
            }
            Err(e) => {
                error!(schedule = %label, error = %e, "Backup cycle failed");
                entry.failed += 1;
                entry.last_error = Some(e.to_string());
                CycleEvent::Failed {
                    label,
                    error: e.to_string(),
                }
            }
        }
    };

    let _ = events.send(event);
}

async fn run_ticker(schedule: Arc<Schedule>, trigger_tx: mpsc::Sender<Trigger>, status: StatusTable) {
    let label = schedule.label();
    let mut last_fire: Option<DateTime<Local>> = None;

    loop {
        let now = Local::now();
        // Never fire the same slot twice if the timer woke a little early
        let from = match last_fire {
            Some(last) if last > now => last,
            _ => now,
        };

        let Some(next) = schedule.trigger().next_fire(&from) else {
            error!(schedule = %label, trigger = %schedule.trigger(), "No upcoming fire time, schedule disarmed");
            return;
        };

        if let Some(entry) = status.lock().get_mut(&label) {
            entry.next_fire = Some(next);
        }
        debug!(schedule = %label, next = %next, "Next cycle scheduled");

        let delay = (next - now).to_std().unwrap_or_default();
        tokio::time::sleep(delay).await;
        last_fire = Some(next);

        let trigger = Trigger {
            label,
            kind: TriggerKind::Timer,
        };
        if trigger_tx.send(trigger).await.is_err() {
            return;
        }
    }
}
