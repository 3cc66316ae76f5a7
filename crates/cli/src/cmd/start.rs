//! Run the backup service in the foreground

use crate::config::BackupArgs;
use crate::daemon;
use crate::shutdown::{self, ShutdownCoordinator};
use anyhow::Result;
use owo_colors::OwoColorize;

pub async fn run(args: &BackupArgs) -> Result<()> {
    let config = args.service_config()?;

    println!("{}", "andbackup".bold());
    println!("Source:      {}", config.layout.source().display().to_string().cyan());
    println!(
        "Long-term:   {} (keep {}) -> {}",
        config.long_term.interval.yellow(),
        config.long_term.max,
        config.layout.long_term_root().display()
    );
    match &config.short_term {
        Some(short) => println!(
            "Short-term:  {} (keep {}) -> {}",
            short.interval.yellow(),
            short.max,
            config.layout.short_term_root().display()
        ),
        None => println!("Short-term:  {}", "disabled".dimmed()),
    }
    println!("{}", "Press Ctrl+C to stop".dimmed());

    let coordinator = ShutdownCoordinator::new();
    let signals = tokio::spawn(shutdown::listen_for_signals(coordinator.clone()));

    let result = daemon::run_service(config, coordinator.clone()).await;

    // Stops the listener if the service ended without a signal
    coordinator.shutdown();
    match signals.await {
        Ok(Err(e)) => tracing::warn!(error = %e, "Signal handler failed"),
        Err(e) => tracing::warn!(error = %e, "Signal task aborted"),
        Ok(Ok(())) => {}
    }

    result
}
