//! End-to-end tests for the `craftctl` binary.
//!
//! Only subcommands that need neither the network nor running servers are
//! exercised here.

use assert_cmd::Command;
use cc_core::layout::ServerLayout;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn craftctl(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("craftctl").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(dir.join("config.json"))
        .arg("--base-dir")
        .arg(dir);
    cmd
}

fn saved_settings(dir: &Path) -> serde_json::Value {
    let content = std::fs::read_to_string(dir.join("config.json")).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("craftctl")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("repair"))
        .stdout(predicate::str::contains("set-count"));
}

#[test]
fn test_check_lists_missing_files() {
    let dir = TempDir::new().unwrap();

    craftctl(dir.path())
        .args(["--backends", "2", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("6 file(s) missing"))
        .stdout(predicate::str::contains("Paper 2 is missing its server jar"));

    assert!(dir.path().join("servers/paper2").is_dir());
}

#[test]
fn test_missing_count_is_prompted_and_saved() {
    let dir = TempDir::new().unwrap();

    craftctl(dir.path())
        .arg("check")
        .write_stdin("2\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("How many Paper servers"));

    assert_eq!(saved_settings(dir.path())["paper_count"], 2);
}

#[test]
fn test_declining_the_count_prompt_fails() {
    let dir = TempDir::new().unwrap();

    craftctl(dir.path())
        .arg("check")
        .write_stdin("\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend server count is required"));

    assert!(!dir.path().join("config.json").exists());
}

#[test]
fn test_backends_flag_is_range_checked() {
    let dir = TempDir::new().unwrap();

    craftctl(dir.path()).args(["--backends", "101", "check"]).assert().failure();
}

#[test]
fn test_set_count() {
    let dir = TempDir::new().unwrap();

    craftctl(dir.path()).args(["set-count", "3"]).assert().success();
    assert_eq!(saved_settings(dir.path())["paper_count"], 3);

    craftctl(dir.path())
        .args(["set-count", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("paper_count"));
    assert_eq!(saved_settings(dir.path())["paper_count"], 3);
}

#[test]
fn test_set_ram_rewrites_start_script() {
    let dir = TempDir::new().unwrap();
    let layout = ServerLayout::build(dir.path(), 1);

    craftctl(dir.path())
        .args(["--backends", "1", "set-ram", "Paper 1", "4"])
        .assert()
        .success();

    let script = std::fs::read_to_string(&layout.get("Paper 1").unwrap().script).unwrap();
    assert!(script.contains("-Xmx4G"));

    craftctl(dir.path())
        .args(["--backends", "1", "set-ram", "Paper 7", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown server"));

    craftctl(dir.path())
        .args(["--backends", "1", "set-ram", "Paper 1", "65"])
        .assert()
        .failure();
}

#[test]
fn test_repair_with_nothing_missing() {
    let dir = TempDir::new().unwrap();
    let layout = ServerLayout::build(dir.path(), 1);
    for def in layout.servers() {
        std::fs::create_dir_all(&def.dir).unwrap();
        std::fs::write(&def.jar, b"jar").unwrap();
        std::fs::write(&def.script, b"script").unwrap();
    }

    craftctl(dir.path())
        .args(["--backends", "1", "repair"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to repair."));
}

#[test]
fn test_status_json_lists_every_server() {
    let dir = TempDir::new().unwrap();

    let output = craftctl(dir.path())
        .args(["--backends", "2", "status", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: Vec<serde_json::Value> = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0]["name"], "BungeeCord");
    assert_eq!(rows[2]["port"], 25567);
}
