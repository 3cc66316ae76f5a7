//! Service configuration
//!
//! Values come from command-line flags and an optional TOML file; flags win.
//! The merged values are validated once into a [`ServiceConfig`] that is
//! handed to the service.
//!
//! Example file:
//! ```toml
//! source = "/data"
//! long_term_interval = "0 3 * * *"
//! long_term_max = 14
//! short_term_interval = "*/15 * * * *"
//! short_term_max = 8
//! ```

use anyhow::{Context, Result};
use backup_core::BackupLayout;
use clap::Args;
use scheduler::{CronExpr, Schedule, ScheduleLabel};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Options shared by every subcommand
#[derive(Debug, Clone, Default, Args)]
pub struct BackupArgs {
    /// Source folder to back up
    #[arg(long)]
    pub source: Option<PathBuf>,

    /// Long-term backup interval (cron pattern)
    #[arg(long, alias = "longTermInterval", value_name = "CRON")]
    pub long_term_interval: Option<CronExpr>,

    /// Maximum number of long-term backups to keep
    #[arg(long, alias = "longTermMax", value_name = "N")]
    pub long_term_max: Option<usize>,

    /// Short-term backup interval (cron pattern)
    #[arg(long, alias = "shortTermInterval", value_name = "CRON")]
    pub short_term_interval: Option<CronExpr>,

    /// Maximum number of short-term backups to keep
    #[arg(long, alias = "shortTermMax", value_name = "N")]
    pub short_term_max: Option<usize>,

    /// Configuration file (default: <config dir>/andbackup/config.toml if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Values as they appear in the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub source: Option<PathBuf>,
    pub long_term_interval: Option<CronExpr>,
    pub long_term_max: Option<usize>,
    pub short_term_interval: Option<CronExpr>,
    pub short_term_max: Option<usize>,
}

impl FileConfig {
    /// Load and parse a TOML configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Fill unset values from `fallback`
    fn or(self, fallback: FileConfig) -> FileConfig {
        FileConfig {
            source: self.source.or(fallback.source),
            long_term_interval: self.long_term_interval.or(fallback.long_term_interval),
            long_term_max: self.long_term_max.or(fallback.long_term_max),
            short_term_interval: self.short_term_interval.or(fallback.short_term_interval),
            short_term_max: self.short_term_max.or(fallback.short_term_max),
        }
    }
}

/// Default configuration file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("andbackup").join("config.toml"))
}

/// Trigger and retention limit for one schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleConfig {
    pub interval: CronExpr,
    pub max: usize,
}

/// Validated service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub layout: BackupLayout,
    pub long_term: ScheduleConfig,
    pub short_term: Option<ScheduleConfig>,
}

impl ServiceConfig {
    /// Validate merged values
    ///
    /// A short-term schedule with only one of interval/limit set is treated
    /// as not configured.
    pub fn from_values(values: FileConfig) -> Result<Self> {
        let source = values.source.context("Missing required option --source")?;

        let long_term = ScheduleConfig {
            interval: values
                .long_term_interval
                .context("Missing required option --long-term-interval")?,
            max: positive(
                values.long_term_max.context("Missing required option --long-term-max")?,
                "--long-term-max",
            )?,
        };

        let short_term = match (values.short_term_interval, values.short_term_max) {
            (Some(interval), Some(max)) => Some(ScheduleConfig {
                interval,
                max: positive(max, "--short-term-max")?,
            }),
            (Some(_), None) => {
                tracing::warn!("--short-term-interval given without --short-term-max; short-term backups disabled");
                None
            }
            (None, Some(_)) => {
                tracing::warn!("--short-term-max given without --short-term-interval; short-term backups disabled");
                None
            }
            (None, None) => None,
        };

        Ok(Self {
            layout: BackupLayout::for_source(&source),
            long_term,
            short_term,
        })
    }

    /// Schedules to register, long-term first
    pub fn schedules(&self) -> Vec<Schedule> {
        let mut schedules = vec![Schedule::new(
            ScheduleLabel::LongTerm,
            self.long_term.interval.clone(),
            self.layout.long_term_root(),
            self.long_term.max,
        )];
        if let Some(short) = &self.short_term {
            schedules.push(Schedule::new(
                ScheduleLabel::ShortTerm,
                short.interval.clone(),
                self.layout.short_term_root(),
                short.max,
            ));
        }
        schedules
    }

    /// The configured schedule for `label`, if any
    pub fn schedule(&self, label: ScheduleLabel) -> Option<Schedule> {
        self.schedules().into_iter().find(|s| s.label() == label)
    }
}

fn positive(value: usize, option: &str) -> Result<usize> {
    if value == 0 {
        anyhow::bail!("{} must be a positive integer", option);
    }
    Ok(value)
}

impl BackupArgs {
    /// Flags merged over the configuration file
    pub fn merged(&self) -> Result<FileConfig> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => match default_config_path() {
                Some(path) if path.is_file() => {
                    tracing::debug!(path = %path.display(), "Using default config file");
                    FileConfig::load(&path)?
                }
                _ => FileConfig::default(),
            },
        };

        let flags = FileConfig {
            source: self.source.clone(),
            long_term_interval: self.long_term_interval.clone(),
            long_term_max: self.long_term_max,
            short_term_interval: self.short_term_interval.clone(),
            short_term_max: self.short_term_max,
        };

        Ok(flags.or(file))
    }

    /// Full configuration for commands that run cycles
    pub fn service_config(&self) -> Result<ServiceConfig> {
        ServiceConfig::from_values(self.merged()?)
    }

    /// Backup layout only (needs just the source)
    pub fn layout(&self) -> Result<BackupLayout> {
        let source = self
            .merged()?
            .source
            .context("Missing required option --source")?;
        Ok(BackupLayout::for_source(&source))
    }
}
