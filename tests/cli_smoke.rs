//! The `circbench` binary: exit codes and output of each command.

#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn circbench(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("circbench").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

/// A workspace with its own config; `.git` keeps discovery from walking
/// past it.
fn workspace(config: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".git")).unwrap();
    std::fs::create_dir_all(dir.path().join(".circbench")).unwrap();
    std::fs::create_dir_all(dir.path().join("model")).unwrap();
    std::fs::write(dir.path().join(".circbench/config.toml"), config).unwrap();
    std::fs::write(
        dir.path().join("solver.sh"),
        "#!/bin/sh\necho \"SOLUTION_DATA = {'num_circles': 1, 'circles': [(0, 0)]}\"\n",
    )
    .unwrap();
    dir
}

const STUB_CONFIG: &str = r#"
[solver]
program = "sh"
args = ["../solver.sh", "-p", "{project_dir}", "{variant}"]
project_dir = "model"
variants = ["Teste1", "Teste2"]

[limits]
timeout_secs = 10.0
optimal_budget_secs = 10.0

[matrix]
sizes = [4]
coverages = [1]

[output]
write_solutions = false
"#;

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    circbench(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("doctor"));
}

#[test]
fn test_invalid_override_exits_with_config_error() {
    let dir = workspace(STUB_CONFIG);
    circbench(dir.path())
        .args(["run", "--timeout", "0"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("limits.timeout_secs"));
}

#[test]
fn test_config_shows_sources() {
    let dir = workspace(STUB_CONFIG);
    circbench(dir.path())
        .args(["config", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"solver.variants\""))
        .stdout(predicate::str::contains("config file"));
}

#[test]
fn test_run_then_status() {
    let dir = workspace(STUB_CONFIG);
    circbench(dir.path())
        .current_dir(dir.path().join("model"))
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Campaign finished: 2 executed"));

    assert!(dir.path().join("tables/results_table.csv").is_file());

    circbench(dir.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 results over 1 registered instances"))
        .stdout(predicate::str::contains("Teste2"));

    // Nothing left to do.
    circbench(dir.path())
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("0 executed, 2 already recorded"));
}

#[test]
fn test_doctor_fails_without_solver() {
    let dir = workspace(
        r#"
[solver]
program = "circbench-missing-solver"
project_dir = "model"
"#,
    );
    circbench(dir.path())
        .args(["doctor", "--json"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("\"solver_path\""))
        .stdout(predicate::str::contains("\"fail\""));
}
