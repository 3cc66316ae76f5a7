//! CLI command execution helpers with automatic timing
//!
//! This module provides a wrapper around the `andbackup` binary that
//! automatically measures execution time and provides convenient
//! assertion methods.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// CLI command builder with timing
pub struct BackupCommand {
    binary_path: PathBuf,
    working_dir: PathBuf,
    args: Vec<String>,
    env: HashMap<String, String>,
}

impl BackupCommand {
    /// Create a new command in the given working directory
    ///
    /// The config directory is pointed at the working directory so a user's
    /// own config file never leaks into a test.
    pub fn new(working_dir: impl AsRef<Path>) -> Self {
        let working_dir = working_dir.as_ref().to_path_buf();
        let mut env = HashMap::new();
        env.insert(
            "XDG_CONFIG_HOME".to_string(),
            working_dir.join(".config").to_string_lossy().into_owned(),
        );

        Self {
            binary_path: PathBuf::from(env!("CARGO_BIN_EXE_andbackup")),
            working_dir,
            args: Vec::new(),
            env,
        }
    }

    /// Add command arguments
    pub fn args(&mut self, args: &[&str]) -> &mut Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    /// Add a path-valued option
    pub fn path_arg(&mut self, flag: &str, path: &Path) -> &mut Self {
        self.args.push(flag.to_string());
        self.args.push(path.to_string_lossy().into_owned());
        self
    }

    /// Set environment variable
    pub fn env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.binary_path);
        command
            .args(&self.args)
            .current_dir(&self.working_dir)
            .env_remove("RUST_LOG")
            .envs(&self.env);
        command
    }

    /// Execute command and return result with timing
    pub fn execute(&self) -> Result<CommandResult> {
        let start = Instant::now();
        let output = self
            .command()
            .output()
            .context("Failed to execute command")?;
        let elapsed = start.elapsed();

        Ok(CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            duration: elapsed,
        })
    }

    /// Start the command without waiting for it (for long-running `start`)
    pub fn spawn(&self) -> Result<Child> {
        self.command()
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to spawn command")
    }

    /// Execute and assert success
    pub fn assert_success(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if !result.success() {
            anyhow::bail!(
                "Command failed (exit code: {}):\nArgs: {:?}\nStdout: {}\nStderr: {}",
                result.exit_code,
                self.args,
                result.stdout,
                result.stderr
            );
        }

        Ok(result)
    }

    /// Execute and expect failure
    pub fn assert_failure(&self) -> Result<CommandResult> {
        let result = self.execute()?;

        if result.success() {
            anyhow::bail!(
                "Command should have failed but succeeded:\nArgs: {:?}\nStdout: {}",
                self.args,
                result.stdout
            );
        }

        Ok(result)
    }
}

/// Command execution result with timing
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

impl CommandResult {
    /// Check if command succeeded
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Check if stdout contains text
    pub fn contains_stdout(&self, text: &str) -> bool {
        self.stdout.contains(text)
    }

    /// Check if stderr contains text
    pub fn contains_stderr(&self, text: &str) -> bool {
        self.stderr.contains(text)
    }

    /// Snapshot names mentioned in stdout, in order of appearance
    pub fn snapshot_names(&self) -> Vec<String> {
        self.stdout.lines().filter_map(extract_snapshot_name).collect()
    }
}

/// Extract a snapshot name (`backup-YYYY-MM-DDTHH-MM-SS-mmmZ`) from a line
pub fn extract_snapshot_name(line: &str) -> Option<String> {
    const NAME_LEN: usize = "backup-2024-01-15T04-30-00-123Z".len();

    let start = line.find("backup-")?;
    let candidate = line.get(start..start + NAME_LEN)?;
    let stamp = &candidate["backup-".len()..];

    let well_formed = stamp.ends_with('Z')
        && stamp[..stamp.len() - 1]
            .chars()
            .all(|c| c.is_ascii_digit() || c == '-' || c == 'T');
    well_formed.then(|| candidate.to_string())
}

/// Macro for convenient command construction
///
/// Usage:
/// ```ignore
/// backup!(dir, "status", "--source", "/data").assert_success()?;
/// ```
#[macro_export]
macro_rules! backup {
    ($dir:expr, $($arg:expr),*) => {{
        let mut cmd = $crate::common::cli::BackupCommand::new($dir);
        cmd.args(&[$($arg),*]);
        cmd
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_name_extraction() {
        let line = "✓ long-term backup backup-2024-01-15T04-30-00-123Z";
        assert_eq!(
            extract_snapshot_name(line),
            Some("backup-2024-01-15T04-30-00-123Z".to_string())
        );
        assert_eq!(extract_snapshot_name("backup-notes.txt"), None);
        assert_eq!(extract_snapshot_name("nothing here"), None);
    }

    #[test]
    fn test_snapshot_names_multiple() {
        let result = CommandResult {
            stdout: "  backup-2024-01-15T04-30-00-124Z  1 KB\n  backup-2024-01-15T04-30-00-123Z  1 KB\n".to_string(),
            stderr: String::new(),
            exit_code: 0,
            duration: Duration::from_millis(10),
        };

        let names = result.snapshot_names();
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "backup-2024-01-15T04-30-00-124Z");
    }
}
