//! Tests for the `steptrace` binary

use super::common::fixtures::python_available;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn steptrace(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("steptrace").expect("binary builds");
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let data = TempDir::new().unwrap();
    steptrace(&data)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("trace"));
}

#[test]
fn test_empty_file_is_rejected() {
    let data = TempDir::new().unwrap();
    let file = data.path().join("empty.py");
    fs::write(&file, "").unwrap();

    steptrace(&data)
        .arg("trace")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#"{"error":"No code provided."}"#));
}

#[test]
fn test_unknown_extension_is_rejected() {
    let data = TempDir::new().unwrap();
    let file = data.path().join("script.rb");
    fs::write(&file, "puts 1\n").unwrap();

    steptrace(&data)
        .arg("trace")
        .arg(&file)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Unsupported language specified."));
}

#[test]
fn test_missing_file_fails() {
    let data = TempDir::new().unwrap();
    steptrace(&data)
        .arg("trace")
        .arg(data.path().join("absent.py"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_writes_config_and_log_into_data_dir() {
    let data = TempDir::new().unwrap();
    let file = data.path().join("empty.cpp");
    fs::write(&file, "").unwrap();

    steptrace(&data).arg("trace").arg(&file).assert().failure();

    assert!(data.path().join("config.toml").exists());
    assert!(data.path().join("logs").join("steptrace.log").exists());
}

#[test]
fn test_traces_python_file() {
    if !python_available() {
        return;
    }
    let data = TempDir::new().unwrap();
    let file = data.path().join("prog.txt");
    fs::write(&file, "x = 1\nx = 2\n").unwrap();

    steptrace(&data)
        .args(["trace", "--language", "python"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(r#"{"trace":[{"#))
        .stdout(predicate::str::contains(r#""event":"end""#));
}
