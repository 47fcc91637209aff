//! Integration tests for the `terra` binary that need no network.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// An endpoint nothing listens on.
const UNREACHABLE: &str = "http://127.0.0.1:9/graphql";

fn terra(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("terra").unwrap();
    cmd.current_dir(dir.path()).env("HOME", dir.path());
    cmd
}

#[test]
fn test_help_lists_commands() {
    let dir = TempDir::new().unwrap();
    terra(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("countries"))
        .stdout(predicate::str::contains("continents"))
        .stdout(predicate::str::contains("country"));
}

#[test]
fn test_country_requires_codes() {
    let dir = TempDir::new().unwrap();
    terra(&dir).arg("country").assert().failure();
}

#[test]
fn test_countries_unreachable_endpoint_fails() {
    let dir = TempDir::new().unwrap();
    terra(&dir)
        .args(["--endpoint", UNREACHABLE, "countries"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Request to http://127.0.0.1:9/graphql failed"));
}

#[test]
fn test_invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("terra.toml");
    fs::write(&config, "[batch]\nmax_batch_size = 0\n").unwrap();

    terra(&dir)
        .arg("--config")
        .arg(&config)
        .arg("continents")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load configuration"));
}

#[test]
fn test_local_config_is_discovered() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(".terrarc"), format!("endpoint = \"{}\"\n", UNREACHABLE)).unwrap();

    terra(&dir)
        .args(["country", "NL", "--cached"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(UNREACHABLE));
}
