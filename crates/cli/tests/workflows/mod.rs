//! Workflow integration tests
//!
//! Tests for complete workflows that exercise multiple commands
//! and validate end-to-end behavior.

#[cfg(unix)]
pub mod service_signals;
pub mod snapshot_lifecycle;
pub mod startup_failures;
