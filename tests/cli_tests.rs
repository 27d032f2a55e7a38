//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn recorder_bin(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("recorder-node").expect("binary built");
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env("HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_output() {
    let home = TempDir::new().unwrap();
    recorder_bin(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("record"))
        .stdout(predicate::str::contains("decode"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--log-level"));
}

#[test]
fn record_help_lists_options() {
    let home = TempDir::new().unwrap();
    recorder_bin(&home)
        .args(["record", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--max-duration"))
        .stdout(predicate::str::contains("--output"))
        .stdout(predicate::str::contains("--node"));
}

#[test]
fn version_output() {
    let home = TempDir::new().unwrap();
    recorder_bin(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("recorder-node"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let home = TempDir::new().unwrap();
    recorder_bin(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("recorder-node"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_init_then_list() {
    let home = TempDir::new().unwrap();
    recorder_bin(&home)
        .args(["config", "init"])
        .assert()
        .success();

    recorder_bin(&home)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_duration"))
        .stdout(predicate::str::contains("10"))
        .stdout(predicate::str::contains("warn"));
}

#[test]
fn config_set_then_get() {
    let home = TempDir::new().unwrap();
    recorder_bin(&home)
        .args(["config", "set", "max_duration", "42"])
        .assert()
        .success();

    recorder_bin(&home)
        .args(["config", "get", "max_duration"])
        .assert()
        .success()
        .stdout(predicate::str::diff("42\n"));
}

#[test]
fn config_get_unset_value() {
    let home = TempDir::new().unwrap();
    recorder_bin(&home)
        .args(["config", "get", "log_level"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(not set)"));
}

#[test]
fn decode_writes_audio() {
    let home = TempDir::new().unwrap();
    let node = home.path().join("node.json");
    std::fs::write(
        &node,
        r#"{"type":"AudioRecorderNode","widgets_values":{"base64_data":"AQIDBA==","audioUI":"data:audio/webm;base64,AQIDBA==","record_duration_max":10}}"#,
    )
    .unwrap();
    let out = home.path().join("clip.webm");

    recorder_bin(&home)
        .arg("decode")
        .arg(&node)
        .arg("--output")
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("audio/webm"));

    assert_eq!(std::fs::read(&out).unwrap(), vec![1, 2, 3, 4]);
}
