//! Snapshot, prune, list and status through the command line

use crate::backup;
use crate::common::TestSource;
use anyhow::Result;
use std::fs;

const EVERY_MINUTE: &str = "* * * * *";

#[test]
fn test_snapshot_retention() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();

    let mut created = Vec::new();
    for _ in 0..3 {
        let result = backup!(
            project.dir(),
            "snapshot",
            "--source",
            &source,
            "--long-term-interval",
            EVERY_MINUTE,
            "--long-term-max",
            "2"
        )
        .assert_success()?;
        created.extend(result.snapshot_names());
        std::thread::sleep(std::time::Duration::from_millis(5));
    }

    assert_eq!(created.len(), 3);
    assert_eq!(project.snapshots(&project.long_term_root()), created[1..].to_vec());

    // Full tree copied, lock released after the one-off run
    let latest = project.long_term_root().join(&created[2]);
    assert_eq!(
        fs::read_to_string(latest.join("docs/notes/todo.txt"))?,
        "water plants\n"
    );
    assert!(!project.lock_path().exists());
    assert!(project.short_term_root().is_dir());

    Ok(())
}

#[test]
fn test_short_term_snapshot() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();

    backup!(
        project.dir(),
        "snapshot",
        "--short-term",
        "--source",
        &source,
        "--long-term-interval",
        "0 3 * * *",
        "--long-term-max",
        "7",
        "--short-term-interval",
        "*/15 * * * *",
        "--short-term-max",
        "4"
    )
    .assert_success()?;

    assert_eq!(project.snapshots(&project.short_term_root()).len(), 1);
    assert!(project.snapshots(&project.long_term_root()).is_empty());

    Ok(())
}

#[test]
fn test_partial_short_term_is_disabled() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();

    let result = backup!(
        project.dir(),
        "snapshot",
        "--short-term",
        "--source",
        &source,
        "--long-term-interval",
        EVERY_MINUTE,
        "--long-term-max",
        "2",
        "--short-term-interval",
        EVERY_MINUTE
    )
    .assert_failure()?;

    assert!(result.contains_stderr("No short-term schedule is configured"));
    assert!(project.snapshots(&project.short_term_root()).is_empty());

    Ok(())
}

#[test]
fn test_camel_case_options() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();

    backup!(
        project.dir(),
        "snapshot",
        "--source",
        &source,
        "--longTermInterval",
        EVERY_MINUTE,
        "--longTermMax",
        "1"
    )
    .assert_success()?;

    assert_eq!(project.snapshots(&project.long_term_root()).len(), 1);
    Ok(())
}

#[test]
fn test_prune_command() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();
    let root = project.long_term_root();
    for day in 1..=3 {
        project.seed_snapshot(&root, day)?;
    }
    fs::write(root.join("notes.txt"), "not a snapshot")?;

    let result = backup!(
        project.dir(),
        "prune",
        "--source",
        &source,
        "--long-term-interval",
        EVERY_MINUTE,
        "--long-term-max",
        "1"
    )
    .assert_success()?;

    assert!(result.contains_stdout("removed"));
    assert_eq!(
        project.snapshots(&root),
        vec!["backup-2024-01-03T00-00-00-000Z".to_string()]
    );
    assert!(root.join("notes.txt").exists());

    Ok(())
}

#[test]
fn test_list_and_status() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();

    let empty = backup!(project.dir(), "list", "--source", &source).assert_success()?;
    assert!(empty.contains_stdout("Directory does not exist"));

    project.seed_snapshot(&project.long_term_root(), 1)?;
    project.seed_snapshot(&project.long_term_root(), 2)?;

    let list = backup!(project.dir(), "list", "--source", &source).assert_success()?;
    assert_eq!(
        list.snapshot_names(),
        vec![
            "backup-2024-01-02T00-00-00-000Z".to_string(),
            "backup-2024-01-01T00-00-00-000Z".to_string(),
        ]
    );
    assert!(list.contains_stdout("2 total"));

    let status = backup!(project.dir(), "status", "--source", &source).assert_success()?;
    assert!(status.contains_stdout("Not running"));
    assert!(status.contains_stdout("Backups:     2"));

    Ok(())
}

#[test]
fn test_config_file() -> Result<()> {
    let project = TestSource::new()?;
    let config_path = project.dir().join("andbackup.toml");
    fs::write(
        &config_path,
        format!(
            "source = {:?}\nlong_term_interval = \"0 3 * * *\"\nlong_term_max = 1\n",
            project.source_arg()
        ),
    )?;
    let config_arg = config_path.to_string_lossy().into_owned();

    backup!(project.dir(), "snapshot", "--config", &config_arg).assert_success()?;
    std::thread::sleep(std::time::Duration::from_millis(5));
    backup!(project.dir(), "snapshot", "--config", &config_arg).assert_success()?;

    assert_eq!(project.snapshots(&project.long_term_root()).len(), 1);

    // Flags override the file
    backup!(
        project.dir(),
        "snapshot",
        "--config",
        &config_arg,
        "--long-term-max",
        "3"
    )
    .assert_success()?;
    assert_eq!(project.snapshots(&project.long_term_root()).len(), 2);

    Ok(())
}

#[test]
fn test_default_config_location() -> Result<()> {
    let project = TestSource::new()?;
    let config_dir = project.dir().join(".config/andbackup");
    fs::create_dir_all(&config_dir)?;
    fs::write(
        config_dir.join("config.toml"),
        format!(
            "source = {:?}\nlong_term_interval = \"0 3 * * *\"\nlong_term_max = 2\n",
            project.source_arg()
        ),
    )?;

    let mut cmd = crate::common::cli::BackupCommand::new(project.dir());
    cmd.args(&["snapshot"]);
    if cfg!(target_os = "linux") {
        cmd.assert_success()?;
        assert_eq!(project.snapshots(&project.long_term_root()).len(), 1);
    }

    Ok(())
}
