use assert_cmd::Command;
use predicates::prelude::*;

fn automation_runs() -> Command {
    let mut cmd = Command::cargo_bin("automation-runs").unwrap();
    cmd.env("RUST_LOG", "error");
    cmd
}

#[test]
fn test_no_command_shows_usage() {
    automation_runs()
        .assert()
        .success()
        .stdout(predicate::str::contains("automation-runs simulate"));
}

#[test]
fn test_policy_lists_every_status() {
    automation_runs()
        .arg("policy")
        .assert()
        .success()
        .stdout(predicate::str::contains("awaiting_checkpoint"))
        .stdout(predicate::str::contains("completed"))
        .stdout(predicate::str::contains("(terminal)"));
}

#[test]
fn test_audit_accepts_resumed_history() {
    automation_runs()
        .args(["audit", "created", "awaiting_checkpoint", "created", "completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Every transition is allowed"));
}

#[test]
fn test_audit_rejects_exit_from_terminal() {
    automation_runs()
        .args(["audit", "created", "completed", "created"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Step 2 is illegal"));
}

#[test]
fn test_audit_rejects_unknown_status() {
    automation_runs()
        .args(["audit", "created", "archived"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("archived"));
}

#[test]
fn test_simulate_completes_runs_with_short_delays() {
    automation_runs()
        .env("AUTOMATION_RUNS__SIMULATION__PROGRESS_DELAY__MIN_MS", "5")
        .env("AUTOMATION_RUNS__SIMULATION__PROGRESS_DELAY__MAX_MS", "10")
        .env("AUTOMATION_RUNS__SIMULATION__COMPLETION_DELAY__MIN_MS", "5")
        .env("AUTOMATION_RUNS__SIMULATION__COMPLETION_DELAY__MAX_MS", "10")
        .args(["simulate", "--runs", "3", "--checkpoint-probability", "1.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Approved checkpoint"))
        .stdout(predicate::str::contains("created=3 completed=3 checkpoints=3 resolved=3"));
}
