//! CLI smoke tests for the dashkit binary
//!
//! Covers help/version output, configuration validation and the list,
//! suggest, mark and download commands against a mock API.

use httpmock::prelude::*;
use serde_json::json;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn run_dashkit(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_dashkit"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute dashkit")
}

/// Writes a config rooted in `home` and pointing at `base_url`.
fn write_config(home: &Path, base_url: &str) -> std::path::PathBuf {
    let path = home.join("config.yaml");
    let yaml = format!(
        "home_dir: \"{}\"\napi:\n  base_url: \"{}\"\n  timeout_sec: 5\nlisting:\n  default_page_size: 2\n  debounce_ms: 10\n",
        home.join("home").to_string_lossy().replace('\\', "/"),
        base_url
    );
    std::fs::write(&path, yaml).unwrap();
    path
}

fn stdout(o: &Output) -> String {
    String::from_utf8_lossy(&o.stdout).into_owned()
}

fn stderr(o: &Output) -> String {
    String::from_utf8_lossy(&o.stderr).into_owned()
}

#[test]
fn test_cli_help_command() {
    let output = run_dashkit(&["--help"]);
    assert!(output.status.success(), "Help command should succeed");

    let out = stdout(&output);
    assert!(out.contains("dashkit"), "Should contain binary name");
    assert!(out.contains("Usage:"), "Should contain usage information");
    for sub in ["list", "suggest", "mark", "download", "check"] {
        assert!(out.contains(sub), "Should contain '{sub}' subcommand");
    }
    assert!(out.contains("--config"), "Should mention config option");
}

#[test]
fn test_cli_version_command() {
    let output = run_dashkit(&["--version"]);
    assert!(output.status.success(), "Version command should succeed");

    let out = stdout(&output);
    assert!(out.contains("dashkit"));
    assert!(out.chars().any(|c| c.is_ascii_digit()), "Should contain version numbers");
}

#[test]
fn test_cli_invalid_command() {
    let output = run_dashkit(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
    assert!(stderr(&output).contains("invalid-command") || stderr(&output).contains("unrecognized"));
}

#[test]
fn test_cli_missing_config_file() {
    let tmp = TempDir::new().unwrap();
    let missing = tmp.path().join("nope.yaml");
    let output = run_dashkit(&["--config", missing.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Missing config should fail");
    assert!(stderr(&output).contains("config file not found"));
}

#[test]
fn test_cli_invalid_config_values() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), "not a url");
    let output = run_dashkit(&["--config", path.to_str().unwrap(), "check"]);

    assert!(!output.status.success(), "Invalid base_url should fail");
    assert!(stderr(&output).contains("api.base_url"));
}

#[test]
fn test_cli_check_command() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), "http://127.0.0.1:9");
    let output = run_dashkit(&["--config", path.to_str().unwrap(), "check"]);

    assert!(output.status.success(), "check failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Configuration check passed"));
    assert!(out.contains("default_page_size: 2"));
    assert!(tmp.path().join("home").is_dir(), "home_dir is created");
}

#[test]
fn test_cli_print_config_with_override() {
    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), "http://127.0.0.1:9");
    let output = run_dashkit(&[
        "--config",
        path.to_str().unwrap(),
        "--base-url",
        "http://10.0.0.1:8000",
        "--print-config",
    ]);

    assert!(output.status.success(), "print-config failed: {}", stderr(&output));
    assert!(stdout(&output).contains("http://10.0.0.1:8000"));
}

#[test]
fn test_cli_list_and_export() {
    let server = MockServer::start();
    let m = server.mock(|when, then| {
        when.method(GET)
            .path("/api/children")
            .query_param("page", "1")
            .query_param("pageSize", "2")
            .query_param("status", "active");
        then.status(200).json_body(json!({
            "items": [{"id": 1, "name": "Ann"}, {"id": 2, "name": "Bo"}],
            "total": 3
        }));
    });

    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), &server.base_url());
    let output = run_dashkit(&[
        "--config",
        path.to_str().unwrap(),
        "list",
        "/api/children",
        "--filter",
        "status=active",
        "--columns",
        "id,name",
        "--export",
        "children",
    ]);

    assert!(output.status.success(), "list failed: {}", stderr(&output));
    m.assert();

    let out = stdout(&output);
    assert!(out.contains("Ann"));
    assert!(out.contains("Bo"));
    assert!(out.contains("page 1 of 2"));
    assert!(out.contains("3 total"));

    let exports = tmp.path().join("home").join("exports");
    let files: Vec<_> = std::fs::read_dir(&exports).unwrap().flatten().collect();
    assert_eq!(files.len(), 1);
    let name = files[0].file_name().to_string_lossy().into_owned();
    assert!(name.starts_with("children-export-") && name.ends_with(".csv"), "{name}");
    assert!(stderr(&output).contains("[info] Exported"), "{}", stderr(&output));
    let csv = std::fs::read_to_string(files[0].path()).unwrap();
    assert_eq!(csv, "id,name\n1,Ann\n2,Bo\n");
}

#[test]
fn test_cli_list_server_error_fails() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/children");
        then.status(500).json_body(json!({"message": "database down"}));
    });

    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), &server.base_url());
    let output = run_dashkit(&["--config", path.to_str().unwrap(), "list", "/api/children"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("database down"), "{}", stderr(&output));
}

#[test]
fn test_cli_suggest() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/families").query_param("search", "lee");
        then.status(200)
            .json_body(json!([{"name": "Lee"}, {"name": "Leeds"}]));
    });

    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), &server.base_url());
    let output = run_dashkit(&["--config", path.to_str().unwrap(), "suggest", "/api/families", "lee"]);

    assert!(output.status.success(), "suggest failed: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Lee\n"));
    assert!(out.contains("Leeds\n"));
}

#[test]
fn test_cli_mark_partial_failure() {
    let server = MockServer::start();
    let ok = server.mock(|when, then| {
        when.method(PUT).path("/api/attendance/7").json_body(json!({"present": true}));
        then.status(200).json_body(json!({"id": 7, "present": true}));
    });
    server.mock(|when, then| {
        when.method(PUT).path("/api/attendance/8");
        then.status(409).json_body(json!({"message": "already closed"}));
    });

    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), &server.base_url());
    let output = run_dashkit(&["--config", path.to_str().unwrap(), "mark", "/api/attendance", "7", "8"]);

    assert!(!output.status.success(), "one failed write fails the command");
    ok.assert();
    assert!(stdout(&output).contains("7: present"));
    let err = stderr(&output);
    assert!(err.contains("[ok] 7 marked present"), "{err}");
    assert!(err.contains("[error] 8: rolled back"), "{err}");
    assert!(err.contains("1 update(s) failed"), "{err}");
}

#[test]
fn test_cli_download() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/api/reports/summary.pdf");
        then.status(200).body("%PDF-1.4 fake");
    });

    let tmp = TempDir::new().unwrap();
    let path = write_config(tmp.path(), &server.base_url());
    let output = run_dashkit(&["--config", path.to_str().unwrap(), "download", "/api/reports/summary.pdf"]);

    assert!(output.status.success(), "download failed: {}", stderr(&output));
    let saved = tmp.path().join("home").join("exports").join("summary.pdf");
    assert_eq!(std::fs::read(saved).unwrap(), b"%PDF-1.4 fake");
}
