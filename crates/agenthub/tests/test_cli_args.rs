//! CLI argument parsing tests for AgentHub

use assert_cmd::Command;
use predicates::prelude::*;

fn hub() -> Command {
    Command::new(env!("CARGO_BIN_EXE_agenthub"))
}

#[test]
fn test_help_flag() {
    hub()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Task execution engine for LLM automation agents",
        ))
        .stdout(predicate::str::contains("--help"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_version_flag() {
    hub()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_no_args_shows_usage() {
    hub()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_help_lists_subcommands() {
    let assert = hub().arg("--help").assert().success();
    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();

    for command in [
        "init", "agents", "submit", "approve", "cancel", "status", "list", "worker",
    ] {
        assert!(stdout.contains(command), "help is missing {}", command);
    }
}

#[test]
fn test_unknown_subcommand() {
    hub()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ========== Submit Arguments ==========

#[test]
fn test_submit_help() {
    hub()
        .args(["submit", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--agent"))
        .stdout(predicate::str::contains("--task"))
        .stdout(predicate::str::contains("--context"))
        .stdout(predicate::str::contains("--approval"))
        .stdout(predicate::str::contains("--max-attempts"));
}

#[test]
fn test_submit_requires_agent_and_task() {
    hub()
        .arg("submit")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--agent"));

    hub()
        .args(["submit", "-a", "bookkeeper"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--task"));
}

#[test]
fn test_submit_rejects_non_numeric_max_attempts() {
    hub()
        .args([
            "submit",
            "-a",
            "bookkeeper",
            "-t",
            "x",
            "--max-attempts",
            "many",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

// ========== Other Subcommands ==========

#[test]
fn test_approve_requires_id() {
    hub()
        .arg("approve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("<ID>"));
}

#[test]
fn test_approve_help_mentions_reject() {
    hub()
        .args(["approve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--reject"))
        .stdout(predicate::str::contains("--feedback"));
}

#[test]
fn test_cancel_and_status_require_id() {
    for command in ["cancel", "status"] {
        hub()
            .arg(command)
            .assert()
            .failure()
            .stderr(predicate::str::contains("<ID>"));
    }
}

#[test]
fn test_list_help() {
    hub()
        .args(["list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--status"))
        .stdout(predicate::str::contains("--limit"));
}

#[test]
fn test_worker_help() {
    hub()
        .args(["worker", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--poll-interval-ms"))
        .stdout(predicate::str::contains("--worker-id"));
}

#[test]
fn test_verbose_is_global() {
    hub()
        .args(["agents", "--help", "--verbose"])
        .assert()
        .success();
}
