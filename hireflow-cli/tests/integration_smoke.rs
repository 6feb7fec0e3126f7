//! Smoke tests to verify command module wiring

use assert_cmd::Command;
use predicates::prelude::*;

fn hireflow() -> Command {
    let mut cmd = Command::cargo_bin("hireflow").unwrap();
    cmd.env_remove("HIREFLOW_CONFIG").env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_help_lists_commands() {
    hireflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("migrate"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_serve_help() {
    hireflow()
        .arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Address to bind to"));
}

#[test]
fn test_migrate_list_needs_no_database() {
    hireflow()
        .arg("migrate")
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("applicant_grade"));
}

#[test]
fn test_migrate_flags_conflict() {
    hireflow()
        .arg("migrate")
        .arg("--list")
        .arg("--status")
        .assert()
        .failure();
}

#[test]
fn test_config_init_then_show() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    hireflow()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .arg("init")
        .assert()
        .success();
    assert!(path.exists());

    hireflow()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    hireflow()
        .arg("--config")
        .arg(&path)
        .arg("config")
        .arg("show")
        .env("HIREFLOW_DB_PASSWORD", "hunter2")
        .assert()
        .success()
        .stdout(predicate::str::contains("bind_addr"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_config_path_honours_flag() {
    hireflow()
        .arg("config")
        .arg("--config")
        .arg("/tmp/hireflow-elsewhere.toml")
        .arg("path")
        .assert()
        .success()
        .stdout(predicate::str::contains("/tmp/hireflow-elsewhere.toml"));
}
