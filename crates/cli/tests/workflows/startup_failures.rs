//! Fatal startup conditions and cycle failures

use crate::backup;
use crate::common::TestSource;
use anyhow::Result;
use std::fs;

#[test]
fn test_missing_source_creates_nothing() -> Result<()> {
    let project = TestSource::new()?;
    fs::remove_dir_all(project.source())?;
    let source = project.source_arg();

    let result = backup!(
        project.dir(),
        "snapshot",
        "--source",
        &source,
        "--long-term-interval",
        "* * * * *",
        "--long-term-max",
        "2"
    )
    .assert_failure()?;

    assert!(result.contains_stderr("does not exist"));
    assert!(project.snapshots(&project.long_term_root()).is_empty());
    assert!(!project.lock_path().exists());

    Ok(())
}

#[test]
fn test_existing_lock_refuses_start() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();
    fs::create_dir_all(project.long_term_root())?;
    fs::write(project.lock_path(), "")?;

    let result = backup!(
        project.dir(),
        "start",
        "--source",
        &source,
        "--long-term-interval",
        "* * * * *",
        "--long-term-max",
        "2"
    )
    .assert_failure()?;

    assert!(result.contains_stderr("Another instance may be running"));
    // The other instance's marker is left alone
    assert!(project.lock_path().exists());
    assert!(project.snapshots(&project.long_term_root()).is_empty());

    Ok(())
}

#[test]
fn test_existing_lock_refuses_snapshot() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();
    fs::create_dir_all(project.long_term_root())?;
    fs::write(project.lock_path(), "")?;

    backup!(
        project.dir(),
        "snapshot",
        "--source",
        &source,
        "--long-term-interval",
        "* * * * *",
        "--long-term-max",
        "2"
    )
    .assert_failure()?;

    assert!(project.lock_path().exists());
    assert!(project.snapshots(&project.long_term_root()).is_empty());
    Ok(())
}

#[test]
fn test_directory_setup_failure() -> Result<()> {
    let project = TestSource::new()?;
    // The roots would live under a regular file
    let blocker = project.dir().join("blocker");
    fs::write(&blocker, "")?;
    let source = blocker.join("data").to_string_lossy().into_owned();

    let result = backup!(
        project.dir(),
        "start",
        "--source",
        &source,
        "--long-term-interval",
        "* * * * *",
        "--long-term-max",
        "2"
    )
    .assert_failure()?;

    assert!(result.contains_stderr("Failed to create backup directories"));
    Ok(())
}

#[test]
fn test_invalid_options_rejected() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();

    for (interval, max) in [("61 * * * *", "2"), ("0 0 30 2 *", "2"), ("* * * * *", "0")] {
        backup!(
            project.dir(),
            "start",
            "--source",
            &source,
            "--long-term-interval",
            interval,
            "--long-term-max",
            max
        )
        .assert_failure()?;
    }

    backup!(project.dir(), "start", "--source", &source).assert_failure()?;

    assert!(!project.long_term_root().exists());
    Ok(())
}
