use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn doorbot() -> Command {
    Command::cargo_bin("doorbot").unwrap()
}

#[test]
fn rejects_stray_arguments() {
    doorbot()
        .arg("unexpected")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected"));
}

#[test]
fn prints_version() {
    doorbot()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("doorbot"));
}

#[test]
fn invalid_poll_interval_is_a_startup_error() {
    doorbot()
        .env("DOORBOT_SIMULATE", "1")
        .env("DOORBOT_POLL_INTERVAL_MS", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DOORBOT_POLL_INTERVAL_MS"));
}

#[test]
fn exits_nonzero_after_the_poll_failure_threshold() {
    let dir = TempDir::new().unwrap();
    doorbot()
        .env("DOORBOT_SIMULATE", "1")
        // Discard port; every poll is refused immediately.
        .env("DOORBOT_SERVER_URL", "http://127.0.0.1:9")
        .env("DOORBOT_POLL_INTERVAL_MS", "5")
        .env("DOORBOT_SOUNDS_DIR", dir.path().join("sounds"))
        .env("DOORBOT_LOG_FILE", dir.path().join("unlock_log.json"))
        .timeout(std::time::Duration::from_secs(60))
        .assert()
        .failure()
        .stderr(predicate::str::contains("poll failures"));
}
