//! Integration tests for the `crm` CLI binary.
//!
//! Argument parsing, help output, completions, and error handling run
//! without a backend; contact commands run against a wiremock server.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `crm` binary with env isolation.
///
/// Clears all `CRM_*` env vars and points the config file at `config`
/// so tests never touch the user's real configuration.
fn crm_cmd(config: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("crm");
    cmd.env("CRM_CONFIG", config)
        .env_remove("CRM_PROFILE")
        .env_remove("CRM_BACKEND")
        .env_remove("CRM_OUTPUT")
        .env_remove("CRM_INSECURE")
        .env_remove("CRM_TIMEOUT")
        .env_remove("RUST_LOG");
    cmd
}

fn isolated() -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    (dir, path)
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Run `crm` on a blocking thread so the mock server keeps serving.
async fn run_against(server: &MockServer, config: &Path, args: &[&str]) -> std::process::Output {
    let mut cmd = crm_cmd(config);
    cmd.arg("--backend").arg(server.uri()).args(args);
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let (_dir, config) = isolated();
    let output = crm_cmd(&config).output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    let (_dir, config) = isolated();
    crm_cmd(&config).arg("--help").assert().success().stdout(
        predicate::str::contains("contacts")
            .and(predicate::str::contains("config"))
            .and(predicate::str::contains("completions")),
    );
}

#[test]
fn test_version_flag() {
    let (_dir, config) = isolated();
    crm_cmd(&config)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("crm"));
}

#[test]
fn test_completions_zsh() {
    let (_dir, config) = isolated();
    crm_cmd(&config)
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

#[test]
fn test_completions_bash() {
    let (_dir, config) = isolated();
    crm_cmd(&config)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let (_dir, config) = isolated();
    let output = crm_cmd(&config).arg("foobar").output().unwrap();
    assert!(!output.status.success());
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_non_numeric_id_is_usage_error() {
    let (_dir, config) = isolated();
    crm_cmd(&config)
        .args(["contacts", "get", "abc"])
        .assert()
        .code(2);
}

#[test]
fn test_invalid_contact_reports_every_field() {
    let (_dir, config) = isolated();
    let output = crm_cmd(&config)
        .args([
            "--backend",
            "http://127.0.0.1:1/",
            "contacts",
            "create",
            "--first-name",
            "Al",
            "--email",
            "not-an-email",
        ])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(2));
    let text = combined_output(&output);
    assert!(text.contains("Invalid contact"), "{text}");
    assert!(text.contains("first_name"), "{text}");
    assert!(text.contains("last_name"), "{text}");
    assert!(text.contains("email"), "{text}");
}

#[test]
fn test_unreachable_backend_shows_generic_error() {
    let (_dir, config) = isolated();
    let output = crm_cmd(&config)
        .args(["--backend", "http://127.0.0.1:1/", "--timeout", "2", "contacts", "list"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("An error has occurred."), "{text}");
}

#[test]
fn test_invalid_backend_url() {
    let (_dir, config) = isolated();
    crm_cmd(&config)
        .args(["--backend", "not a url", "contacts", "list"])
        .assert()
        .code(2);
}

#[test]
fn test_unknown_profile() {
    let (_dir, config) = isolated();
    let output = crm_cmd(&config)
        .args(["--profile", "nope", "contacts", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("nope"));
}

// ── Config commands ─────────────────────────────────────────────────

#[test]
fn test_config_path_honors_override() {
    let (_dir, config) = isolated();
    crm_cmd(&config)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(config.to_string_lossy().as_ref()));
}

#[test]
fn test_config_use_switches_default_profile() {
    let (_dir, config) = isolated();
    std::fs::write(
        &config,
        "[profiles.local]\n[profiles.staging]\nbackend_url = \"https://staging.example.com/\"\n",
    )
    .unwrap();

    crm_cmd(&config).args(["config", "use", "staging"]).assert().success();
    crm_cmd(&config)
        .args(["config", "profiles"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* staging"));
}

#[test]
fn test_config_use_rejects_unknown_profile() {
    let (_dir, config) = isolated();
    std::fs::write(&config, "[profiles.local]\n").unwrap();

    let output = crm_cmd(&config).args(["config", "use", "staging"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("staging"), "{text}");
    assert!(text.contains("local"), "{text}");
}

// ── Contacts against a mock backend ─────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_list_as_json() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 42, "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let output = run_against(&server, &config, &["-o", "json-compact", "contacts", "list"]).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body[0]["id"], 42);
    assert_eq!(body[0]["first_name"], "Ada");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_create_prints_new_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 7, "first_name": "Bob", "last_name": "Xuan", "email": "bob@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let output = run_against(
        &server,
        &config,
        &[
            "-o", "plain", "contacts", "create",
            "--first-name", "Bob", "--last-name", "Xuan", "--email", "bob@example.com",
        ],
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "7");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_edit_loads_then_updates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42, "first_name": "Ada", "last_name": "Lovelace", "email": "ada@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/42"))
        .and(wiremock::matchers::body_partial_json(json!({
            "first_name": "Ada", "company": "Analytical Engines"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42, "first_name": "Ada", "last_name": "Lovelace",
            "email": "ada@example.com", "company": "Analytical Engines"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let output = run_against(
        &server,
        &config,
        &["-o", "json", "contacts", "edit", "42", "--company", "Analytical Engines"],
    )
    .await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Analytical Engines"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backend_error_exit_code() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/9"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let (_dir, config) = isolated();
    let quiet = run_against(&server, &config, &["contacts", "get", "9"]).await;
    assert_eq!(quiet.status.code(), Some(1));
    assert!(combined_output(&quiet).contains("An error has occurred."));

    let verbose = run_against(&server, &config, &["-v", "contacts", "get", "9"]).await;
    assert_eq!(verbose.status.code(), Some(1));
    assert!(combined_output(&verbose).contains("404"));
}
