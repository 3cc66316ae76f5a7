//! Service lifecycle management
//!
//! Startup prepares the destination roots, takes the instance lock and
//! registers the configured schedules. The service then runs until shutdown
//! is requested, waits for in-flight cycles, and releases the lock.

use crate::config::ServiceConfig;
use crate::locks::InstanceLock;
use crate::shutdown::ShutdownCoordinator;
use anyhow::{Context, Result};
use backup_core::SnapshotNamer;
use retention::PruneReport;
use scheduler::{
    CycleEvent, CycleRunner, CycleSummary, EngineHandle, ScheduleEngine, ScheduleLabel,
    SnapshotCycle,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};

/// A configured, not yet started backup service
#[derive(Debug, Clone)]
pub struct BackupService {
    config: ServiceConfig,
    namer: SnapshotNamer,
}

impl BackupService {
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_namer(config, SnapshotNamer::new())
    }

    /// Use a specific namer (tests drive it with a manual clock)
    pub fn with_namer(config: ServiceConfig, namer: SnapshotNamer) -> Self {
        Self { config, namer }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    fn lock(&self) -> InstanceLock {
        InstanceLock::new(self.config.layout.lock_path())
    }

    /// Create the destination roots and take the instance lock
    fn prepare(&self) -> Result<InstanceLock> {
        let layout = &self.config.layout;
        layout
            .ensure_roots()
            .context("Failed to create backup directories")?;

        let lock = self.lock();
        if !lock.acquire()? {
            anyhow::bail!(
                "Another instance may be running (lock file {} exists)",
                lock.path().display()
            );
        }
        Ok(lock)
    }

    /// Run startup; on success the lock is held and schedules are registered
    ///
    /// Any failure here is fatal and leaves no schedule registered.
    pub fn startup(self) -> Result<StartedService> {
        let lock = self.prepare()?;

        let runner: Arc<dyn CycleRunner> = Arc::new(SnapshotCycle::new(
            self.config.layout.source(),
            self.namer.clone(),
        ));
        let mut engine = ScheduleEngine::new(runner);

        for schedule in self.config.schedules() {
            if let Err(e) = engine.register(schedule) {
                lock.release();
                return Err(e).context("Failed to register schedule");
            }
        }

        info!(
            source = %self.config.layout.source().display(),
            schedules = engine.schedules().count(),
            "Backup service started"
        );

        Ok(StartedService { lock, engine })
    }

    /// Run a single copy-and-prune cycle for `label` under the lock
    pub fn snapshot_once(&self, label: ScheduleLabel) -> Result<CycleSummary> {
        let schedule = self
            .config
            .schedule(label)
            .with_context(|| format!("No {} schedule is configured", label))?;

        let lock = self.prepare()?;
        let cycle = SnapshotCycle::new(self.config.layout.source(), self.namer.clone());
        let result = cycle.run_cycle(&schedule);
        lock.release();

        result.with_context(|| format!("{} backup failed", label))
    }

    /// Prune the root for `label` to its limit under the lock, without copying
    pub fn prune_once(&self, label: ScheduleLabel) -> Result<PruneReport> {
        let schedule = self
            .config
            .schedule(label)
            .with_context(|| format!("No {} schedule is configured", label))?;

        let lock = self.prepare()?;
        let result = retention::prune(schedule.destination(), schedule.retention());
        lock.release();

        result.with_context(|| format!("Failed to prune {} backups", label))
    }
}

/// A service holding the lock with its schedules registered
pub struct StartedService {
    lock: InstanceLock,
    engine: ScheduleEngine,
}

impl StartedService {
    /// Handle for manual triggers and status
    pub fn handle(&self) -> EngineHandle {
        self.engine.handle()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CycleEvent> {
        self.engine.subscribe()
    }

    pub fn lock(&self) -> &InstanceLock {
        &self.lock
    }

    /// Run schedules until `shutdown` resolves, then release the lock
    pub async fn run_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let StartedService { lock, engine } = self;
        engine.run(shutdown).await;
        lock.release();
        info!("Backup service stopped");
    }
}

/// Start the service and run it until the coordinator signals shutdown
pub async fn run_service(config: ServiceConfig, coordinator: ShutdownCoordinator) -> Result<()> {
    let service = BackupService::new(config).startup().map_err(|e| {
        error!(error = %format!("{:#}", e), "Startup failed");
        e
    })?;

    service.run_until(coordinator.wait_for_shutdown()).await;
    Ok(())
}
