//! Integration tests for the `opfleet` CLI binary.
//!
//! These drive real scenario files through the binary and check the
//! rendered fleet, exit codes, and config handling.
#![allow(clippy::unwrap_used)]

use std::path::{Path, PathBuf};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `opfleet` binary with env isolation.
///
/// Clears `OPFLEET_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn opfleet_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("opfleet");
    cmd.env("HOME", "/tmp/opfleet-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/opfleet-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("OPFLEET_CONFIG")
        .env_remove("OPFLEET_DEFAULTS__OUTPUT")
        .env_remove("OPFLEET_DEFAULTS__COLOR")
        .env_remove("OPFLEET_DELIVERY__CONTENT_TYPE")
        .env_remove("OPFLEET_CATALOG__BUILTIN");
    cmd
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

const SUPERVISOR: &str = "550e8400-e29b-41d4-a716-446655440000";

/// Supervisor reports three devices, drops one, then a push to each kind
/// of target.
fn scenario() -> String {
    format!(
        r#"
steps:
  - step: connect
    session: sup
  - step: report
    session: sup
    agent: {SUPERVISOR}
    name: supervisor
    devices: [device-1, device-2, device-9]
  - step: report
    session: sup
    agent: {SUPERVISOR}
    name: supervisor
    devices: [device-1, device-2]
    effective_config:
      device-2: "running: true"
  - step: push
    device: device-1
    config: "exporters: {{}}"
  - step: push
    device: device-9
    config: "exporters: {{}}"
  - step: push
    device: nope
    config: "exporters: {{}}"
"#
    )
}

fn replay_json(dir: &TempDir, extra: &[&str]) -> Value {
    let file = write(dir.path(), "scenario.yaml", &scenario());
    let output = opfleet_cmd()
        .args(["replay", "-o", "json"])
        .args(extra)
        .arg(&file)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    serde_json::from_slice(&output.stdout).unwrap()
}

fn device<'a>(report: &'a Value, id: &str) -> &'a Value {
    report["devices"]
        .as_array()
        .unwrap()
        .iter()
        .find(|d| d["id"] == id)
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = opfleet_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    opfleet_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("replay")
            .and(predicate::str::contains("catalog"))
            .and(predicate::str::contains("config")),
    );
}

#[test]
fn test_version_flag() {
    opfleet_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("opfleet"));
}

#[test]
fn test_invalid_subcommand() {
    let output = opfleet_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    opfleet_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    opfleet_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Catalog ─────────────────────────────────────────────────────────

#[test]
fn test_catalog_list_plain() {
    opfleet_cmd()
        .args(["catalog", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout("device-1\ndevice-2\ndevice-3\n");
}

#[test]
fn test_catalog_show_builtin() {
    opfleet_cmd()
        .args(["catalog", "show", "device-2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("metrics:").and(predicate::str::contains("otlp")));
}

#[test]
fn test_catalog_show_unknown_device() {
    opfleet_cmd()
        .args(["catalog", "show", "device-9"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_catalog_entries_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "config.toml",
        "[catalog]\nbuiltin = false\n\n[catalog.entries]\nedge-1 = \"receivers: {}\\n\"\n",
    );

    opfleet_cmd()
        .arg("--config")
        .arg(&config)
        .args(["catalog", "list", "-o", "plain"])
        .assert()
        .success()
        .stdout("edge-1\n");
}

// ── Config ──────────────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // A missing default config file is fine: defaults render.
    opfleet_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("content_type = \"text/yaml\""));
}

#[test]
fn test_config_show_applies_environment() {
    opfleet_cmd()
        .env("OPFLEET_DELIVERY__CONTENT_TYPE", "application/x-yaml")
        .args(["config", "show", "-o", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("application/x-yaml"));
}

#[test]
fn test_config_path_follows_flag() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "opfleet.toml", "");

    opfleet_cmd()
        .arg("--config")
        .arg(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("opfleet.toml"));
}

#[test]
fn test_missing_explicit_config_is_usage_error() {
    opfleet_cmd()
        .args(["--config", "/tmp/opfleet-cli-test-nonexistent/nope.toml"])
        .args(["config", "show"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Configuration file not found"));
}

#[test]
fn test_invalid_output_format() {
    let output = opfleet_cmd()
        .args(["--output", "invalid", "catalog", "list"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(combined_output(&output).contains("invalid"));
}

// ── Replay ──────────────────────────────────────────────────────────

#[test]
fn test_replay_reports_push_outcomes() {
    let dir = tempfile::tempdir().unwrap();
    let report = replay_json(&dir, &[]);

    let outcomes: Vec<_> = report["pushes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["outcome"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(
        outcomes,
        vec!["delivered", "device_unreachable", "device_not_found"]
    );
}

#[test]
fn test_replay_reconciles_devices() {
    let dir = tempfile::tempdir().unwrap();
    let report = replay_json(&dir, &[]);

    let d1 = device(&report, "device-1");
    assert_eq!(d1["state"], "connected");
    assert_eq!(d1["config"], "exporters: {}");
    assert_eq!(d1["config_origin"], "pushed");
    assert_eq!(d1["supervisor_id"], SUPERVISOR);

    let d2 = device(&report, "device-2");
    assert_eq!(d2["config"], "running: true");
    assert_eq!(d2["config_origin"], "reported");

    let d9 = device(&report, "device-9");
    assert_eq!(d9["state"], "disconnected");
    assert_eq!(d9["config"], "# No default configuration available");

    let agents = report["agents"].as_array().unwrap();
    assert_eq!(agents.len(), 1);
    assert_eq!(agents[0]["is_supervisor"], true);
}

#[test]
fn test_replay_show_filters_sections() {
    let dir = tempfile::tempdir().unwrap();
    let report = replay_json(&dir, &["--show", "agents"]);
    assert!(report.get("agents").is_some());
    assert!(report.get("devices").is_none());
}

#[test]
fn test_replay_table_output() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "scenario.yaml", &scenario());

    opfleet_cmd()
        .arg("replay")
        .arg(&file)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Pushes")
                .and(predicate::str::contains("Agents"))
                .and(predicate::str::contains("Devices"))
                .and(predicate::str::contains("device_unreachable")),
        );
}

#[test]
fn test_replay_strict_fails_on_first_undelivered_push() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "scenario.yaml", &scenario());

    opfleet_cmd()
        .args(["replay", "--strict"])
        .arg(&file)
        .assert()
        .code(7)
        .stderr(predicate::str::contains("device-9"));
}

#[test]
fn test_replay_json_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(
        dir.path(),
        "scenario.json",
        &format!(
            r#"{{"steps":[
                {{"step":"report","session":"a","agent":"{SUPERVISOR}","name":"supervisor","devices":["device-3"]}},
                {{"step":"disconnect","session":"a"}},
                {{"step":"push","device":"device-3","config":"x: 1"}}
            ]}}"#
        ),
    );

    opfleet_cmd()
        .args(["replay", "-o", "plain", "--show", "devices"])
        .arg(&file)
        .assert()
        .success()
        .stdout("device-3\tsupervisor_unreachable\ndevice-3\tconnected\n");
}

#[test]
fn test_replay_invalid_scenario() {
    let dir = tempfile::tempdir().unwrap();
    let file = write(dir.path(), "bad.yaml", "steps:\n  - step: reboot\n");

    opfleet_cmd()
        .arg("replay")
        .arg(&file)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid scenario"));
}

#[test]
fn test_replay_missing_file() {
    opfleet_cmd()
        .args(["replay", "/tmp/opfleet-cli-test-nonexistent/none.yaml"])
        .assert()
        .code(2);
}
