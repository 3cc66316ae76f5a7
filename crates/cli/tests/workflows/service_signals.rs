//! Running service: status while running and shutdown on signal

use crate::backup;
use crate::common::TestSource;
use anyhow::Result;
use std::process::Command;
use std::time::{Duration, Instant};

/// Poll `check` until it holds or `timeout` passes
fn wait_for(timeout: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if check() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    check()
}

#[test]
fn test_sigint_releases_lock() -> Result<()> {
    let project = TestSource::new()?;
    let source = project.source_arg();

    let mut child = backup!(
        project.dir(),
        "start",
        "--source",
        &source,
        "--long-term-interval",
        "0 0 1 1 *",
        "--long-term-max",
        "2"
    )
    .spawn()?;

    let lock_path = project.lock_path();
    assert!(
        wait_for(Duration::from_secs(10), || lock_path.exists()),
        "service never took the lock"
    );

    let status = backup!(project.dir(), "status", "--source", &source).assert_success()?;
    assert!(status.contains_stdout("Running"));
    assert!(status.contains_stdout(&child.id().to_string()));

    // A second instance is refused while the first runs
    backup!(
        project.dir(),
        "start",
        "--source",
        &source,
        "--long-term-interval",
        "0 0 1 1 *",
        "--long-term-max",
        "2"
    )
    .assert_failure()?;
    assert!(lock_path.exists());

    let kill = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()?;
    assert!(kill.success());

    let mut exit = None;
    let exited = wait_for(Duration::from_secs(10), || {
        exit = child.try_wait().ok().flatten();
        exit.is_some()
    });
    if !exited {
        let _ = child.kill();
        anyhow::bail!("service did not stop after SIGINT");
    }

    assert!(exit.is_some_and(|status| status.success()));
    assert!(!lock_path.exists());
    Ok(())
}
