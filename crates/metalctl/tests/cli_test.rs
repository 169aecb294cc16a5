//! Integration tests for the `metalctl` binary.
//!
//! Argument parsing, help, completion and context handling run without
//! any API; entity commands run against a wiremock metal-api.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// A `metalctl` command isolated from the user's environment.
///
/// `METALCTL_*` variables are cleared and home and working directory
/// point into `dir`, so no real config file is ever found.
fn metalctl(dir: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("metalctl");
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("KUBECONFIG", dir.join("kubeconfig"))
        .env_remove("COMPLETE");
    for (key, _) in std::env::vars() {
        if key.starts_with("METALCTL_") {
            cmd.env_remove(key);
        }
    }
    cmd
}

fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

fn partitions() -> serde_json::Value {
    serde_json::json!([
        {"id": "fra-equ01", "name": "Frankfurt", "description": "primary"},
        {"id": "ams-dc1", "name": "Amsterdam"}
    ])
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn no_args_shows_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = metalctl(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(combined_output(&output).contains("Usage"));
}

#[test]
fn help_lists_entity_commands() {
    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path()).arg("--help").assert().success().stdout(
        predicate::str::contains("machine")
            .and(predicate::str::contains("network"))
            .and(predicate::str::contains("context")),
    );
}

#[test]
fn version_flag() {
    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("metalctl"));
}

#[test]
fn completion_script_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path())
        .arg("frobnicate")
        .assert()
        .code(2);
}

// ── Configuration ───────────────────────────────────────────────────

#[test]
fn missing_api_url_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path())
        .args(["partition", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error: no API URL configured"));
}

#[test]
fn explicit_config_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path())
        .args(["--config", "absent.yaml", "context", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn contexts_are_added_and_switched() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.yaml");
    std::fs::write(&config, "contexts: {}\n").unwrap();
    let config = config.to_str().unwrap();

    for (name, url) in [("prod", "https://api.prod"), ("dev", "https://api.dev")] {
        metalctl(dir.path())
            .args(["--config", config, "context", "add", name, "--url", url])
            .args(["--token", &format!("{name}-token"), "--v2-url", "https://v2.example"])
            .assert()
            .success();
    }
    let stored = std::fs::read_to_string(config).unwrap();
    assert!(stored.contains("api_token: prod-token"), "{stored}");
    assert!(stored.contains("api-v2-url: https://v2.example"), "{stored}");
    metalctl(dir.path())
        .args(["--config", config, "context", "short"])
        .assert()
        .success()
        .stdout("prod\n");

    metalctl(dir.path())
        .args(["--config", config, "context", "set", "dev"])
        .assert()
        .success();
    metalctl(dir.path())
        .args(["--config", config, "context", "set", "-"])
        .assert()
        .success();
    metalctl(dir.path())
        .args(["--config", config, "context", "short"])
        .assert()
        .success()
        .stdout("prod\n");

    metalctl(dir.path())
        .args(["--config", config, "-o", "json", "context", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://api.dev"));
}

// ── Against a mocked API ────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn list_renders_a_sorted_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/partition"))
        .respond_with(ResponseTemplate::new(200).set_body_json(partitions()))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let output = metalctl(dir.path())
        .args(["--api-url", &server.uri(), "partition", "list"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", combined_output(&output));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(lines[0].starts_with("ID"));
    assert!(lines[1].starts_with("ams-dc1"));
    assert!(lines[2].starts_with("fra-equ01"));
}

#[tokio::test(flavor = "multi_thread")]
async fn describe_defaults_to_yaml() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/partition/fra-equ01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&partitions()[0]))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path())
        .args(["--api-url", &server.uri(), "partition", "describe", "fra-equ01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("id: fra-equ01"));
}

#[tokio::test(flavor = "multi_thread")]
async fn create_conflict_exits_with_one() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/partition"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(serde_json::json!({"message": "exists"})),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("p.yaml"), "id: fra-equ01\n").unwrap();
    metalctl(dir.path())
        .args(["--api-url", &server.uri(), "partition", "create", "-f", "p.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::starts_with("Error:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn apply_update_needs_force_without_a_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/v1/partition"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(serde_json::json!({"message": "exists"})),
        )
        .mount(&server)
        .await;
    // Only the forced run may reach the update.
    Mock::given(method("POST"))
        .and(path("/v1/partition"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&partitions()[0]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("p.yaml"), "id: fra-equ01\n").unwrap();
    metalctl(dir.path())
        .args(["--api-url", &server.uri(), "partition", "apply", "-f", "p.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed partition fra-equ01"))
        .stderr(predicate::str::contains("requires confirmation"));
    metalctl(dir.path())
        .args(["--api-url", &server.uri(), "--force", "partition", "apply", "-f", "p.yaml"])
        .assert()
        .success()
        .stderr(predicate::str::contains("updated partition fra-equ01"));
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_needs_force_without_a_terminal() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/partition/fra-equ01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&partitions()[0]))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    metalctl(dir.path())
        .args(["--api-url", &server.uri(), "partition", "delete", "fra-equ01"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("requires confirmation"));
    metalctl(dir.path())
        .args(["--api-url", &server.uri(), "--force", "partition", "delete", "fra-equ01"])
        .assert()
        .success();
}
