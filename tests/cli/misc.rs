use crate::support::skillbench;
use predicates::prelude::*;

#[test]
fn test_help_flag() {
    skillbench()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: skillbench"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("transcript"));
}

#[test]
fn test_version_flag() {
    skillbench()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("skillbench"));
}

#[test]
fn test_unknown_model_is_usage_error() {
    skillbench()
        .args(["run", "--skill", ".", "--tests", "suite.yaml", "--model", "gpt-9"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unsupported model tier"));
}

#[test]
fn test_zero_runs_is_usage_error() {
    skillbench()
        .args(["run", "--skill", ".", "--tests", "suite.yaml", "--runs", "0"])
        .assert()
        .code(2);
}
