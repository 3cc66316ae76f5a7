//! andbackup service and command-line front end
//!
//! The binary in `main.rs` only parses arguments; everything it runs lives
//! here so integration tests can drive the service in-process.

pub mod cmd;
pub mod config;
pub mod daemon;
pub mod locks;
pub mod logging;
pub mod shutdown;
pub mod util;

pub use config::{BackupArgs, FileConfig, ScheduleConfig, ServiceConfig};
pub use daemon::{BackupService, StartedService};
pub use locks::{InstanceLock, LockHolder};
pub use shutdown::ShutdownCoordinator;
