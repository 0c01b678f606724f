//! Integration tests for the `thingsbridge` CLI binary.
//!
//! Argument parsing, completions, and error exits run without a server.
//! End-to-end flows point the binary at a wiremock device API and an
//! isolated config file.
#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "cli-token";

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the binary with env isolation.
///
/// Clears all `THINGSBRIDGE_*` env vars and points config directories at a
/// nonexistent path so tests never touch the user's real configuration.
fn tb_cmd() -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("thingsbridge");
    cmd.env("HOME", "/tmp/thingsbridge-cli-test-nonexistent")
        .env("XDG_CONFIG_HOME", "/tmp/thingsbridge-cli-test-nonexistent")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("THINGSBRIDGE_CONFIG")
        .env_remove("THINGSBRIDGE_ENTRY")
        .env_remove("THINGSBRIDGE_OUTPUT")
        .env_remove("THINGSBRIDGE_INSECURE");
    cmd
}

/// Same as [`tb_cmd`], bound to an explicit config file.
fn tb_with_config(config: &Path) -> assert_cmd::Command {
    let mut cmd = tb_cmd();
    cmd.arg("--config").arg(config);
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn attributes_path() -> String {
    format!("/api/v1/{TOKEN}/attributes")
}

async fn mount_attributes(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(attributes_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "client": { "temp": 21.5 },
            "shared": { "setpoint": 22 }
        })))
        .mount(server)
        .await;
}

/// Run `setup` against `server` and return the new entry id.
fn setup_entry(config: &Path, server: &MockServer) -> String {
    let output = tb_with_config(config)
        .args(["setup", "--host"])
        .arg(server.uri())
        .args(["--token", TOKEN])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "setup failed:\n{}",
        combined_output(&output)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_owned()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = tb_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_lists_commands() {
    tb_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("ThingsBoard")
            .and(predicate::str::contains("setup"))
            .and(predicate::str::contains("points"))
            .and(predicate::str::contains("watch")),
    );
}

#[test]
fn test_version_flag() {
    tb_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("thingsbridge"));
}

#[test]
fn test_completions_zsh() {
    tb_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_invalid_subcommand() {
    let output = tb_cmd().arg("frobnicate").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("frobnicate"));
}

#[test]
fn test_watch_rejects_zero_interval() {
    let output = tb_cmd().args(["watch", "--interval", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("interval"));
}

#[test]
fn test_set_many_requires_a_source() {
    let output = tb_cmd().arg("set-many").output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Config without a server ─────────────────────────────────────────

#[test]
fn test_entries_list_empty_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    tb_with_config(&config)
        .args(["-o", "json", "entries", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_points_without_entries_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = tb_with_config(&config).arg("points").output().unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("No configuration entries"));
}

#[test]
fn test_unknown_entry_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = tb_with_config(&config)
        .args(["--entry", "missing", "set", "target", "5"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(4));
    assert!(combined_output(&output).contains("missing"));
}

// ── Against a device API ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_setup_writes_config_entry() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let entry_id = setup_entry(&config, &server);
    assert!(!entry_id.is_empty());

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(saved.contains(&server.uri()), "config:\n{saved}");
    assert!(saved.contains(&entry_id), "config:\n{saved}");

    tb_with_config(&config)
        .args(["-o", "plain", "entries", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(entry_id));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_setup_rejected_token_exits_auth() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(attributes_path()))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    let output = tb_with_config(&config)
        .args(["setup", "--host"])
        .arg(server.uri())
        .args(["--token", TOKEN])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));
    assert!(!config.exists());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_setup_same_host_and_token_conflicts() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");

    setup_entry(&config, &server);
    let output = tb_with_config(&config)
        .args(["setup", "--host"])
        .arg(server.uri())
        .args(["--token", TOKEN])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(6));
    assert!(combined_output(&output).contains("already configured"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_points_lists_flattened_keys() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    setup_entry(&config, &server);

    tb_with_config(&config)
        .args(["-o", "plain", "points"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("client_temp=21.5")
                .and(predicate::str::contains("shared_setpoint=22")),
        );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_posts_bare_attribute_name() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    Mock::given(method("POST"))
        .and(path(attributes_path()))
        .and(body_json(json!({ "setpoint": 23.5 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    setup_entry(&config, &server);

    tb_with_config(&config)
        .args(["set", "setpoint", "23.5"])
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_points_set_rejects_read_only_point() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    setup_entry(&config, &server);

    let output = tb_with_config(&config)
        .args(["points", "set", "client_temp", "3"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("read-only"));
}

/// Mount a POST that only matches `body` and must be hit exactly once.
async fn expect_post(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(attributes_path()))
        .and(body_json(body))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_many_posts_inline_json() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    expect_post(&server, json!({ "setpoint": 21, "mode": "eco" })).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    setup_entry(&config, &server);

    tb_with_config(&config)
        .args(["set-many", "--json", r#"{"setpoint": 21, "mode": "eco"}"#])
        .assert()
        .success()
        .stderr(predicate::str::contains("Attributes updated"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_many_posts_file_contents() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    expect_post(&server, json!({ "setpoint": 19.5, "boost": true })).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    setup_entry(&config, &server);

    let body = dir.path().join("attributes.json");
    std::fs::write(&body, r#"{"setpoint": 19.5, "boost": true}"#).unwrap();

    tb_with_config(&config)
        .arg("set-many")
        .arg("--from-file")
        .arg(&body)
        .assert()
        .success();
}

#[tokio::test(flavor = "multi_thread")]
async fn test_set_many_failed_post_exits_nonzero() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    Mock::given(method("POST"))
        .and(path(attributes_path()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    setup_entry(&config, &server);

    let output = tb_with_config(&config)
        .args(["set-many", "--json", r#"{"setpoint": 21}"#])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(!combined_output(&output).contains(TOKEN));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_entries_remove_drops_entry_from_file() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    let entry_id = setup_entry(&config, &server);

    tb_with_config(&config)
        .args(["--yes", "entries", "remove", entry_id.as_str()])
        .assert()
        .success()
        .stderr(predicate::str::contains(format!("Removed entry {entry_id}")));

    let saved = std::fs::read_to_string(&config).unwrap();
    assert!(!saved.contains(&entry_id), "config:\n{saved}");

    tb_with_config(&config)
        .args(["-o", "json", "entries", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_watch_reports_discovery_and_refreshes() {
    let server = MockServer::start().await;
    mount_attributes(&server).await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    setup_entry(&config, &server);

    // Runs until killed by the timeout.
    let output = tb_with_config(&config)
        .args(["watch", "--interval", "1"])
        .timeout(Duration::from_secs(4))
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+ client_temp (read_only)"), "stdout:\n{stdout}");
    assert!(stdout.contains("+ shared_setpoint (read_write)"), "stdout:\n{stdout}");
    assert!(stdout.contains("ok, 2 attributes"), "stdout:\n{stdout}");
}
