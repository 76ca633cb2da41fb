use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("parley")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("sessions"))
        .stdout(predicate::str::contains("send"))
        .stdout(predicate::str::contains("feedback"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_sessions_help_shows_subcommands() {
    cargo_bin_cmd!("parley")
        .args(["sessions", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("new"))
        .stdout(predicate::str::contains("show"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_feedback_without_rating_is_rejected() {
    cargo_bin_cmd!("parley")
        .args(["feedback", "m1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--up"));
}
