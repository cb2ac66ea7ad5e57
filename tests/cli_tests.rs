#![cfg(feature = "integration")]

mod common;

use common::relay_cmd;
use predicates::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn catalog_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("volumes.yaml")
}

fn relay(args: &[&str]) -> assert_cmd::Command {
    let mut cmd = relay_cmd();
    cmd.arg("--catalog").arg(catalog_path()).args(args).env_remove("RELAY_ZONE");
    cmd
}

fn stdout_json(args: &[&str]) -> Value {
    let output = relay(args).output().unwrap();
    assert!(
        output.status.success(),
        "relay {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_list_shows_operations() {
    relay(&["list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Operations in 'volumes':"))
        .stdout(predicate::str::contains("create-volume"))
        .stdout(predicate::str::contains("POST /volumes"))
        .stdout(predicate::str::contains("GET /volumes/{name}"));
}

#[test]
fn test_run_binds_positional_and_defaults() {
    let body = stdout_json(&["run", "create-volume", "data"]);
    assert_eq!(body, json!({"name": "data", "size": 10}));
}

#[test]
fn test_run_accepts_flags_after_positionals() {
    let body = stdout_json(&["run", "create-volume", "data", "--size", "50", "--type=ssd"]);
    assert_eq!(body, json!({"name": "data", "size": 50, "type": "ssd"}));
}

#[test]
fn test_run_outputs_yaml() {
    relay(&["--format", "yaml", "run", "create-volume", "data"])
        .assert()
        .success()
        .stdout("name: data\nsize: 10\n");
}

#[test]
fn test_run_follows_link() {
    let body = stdout_json(&["run", "create-volume", "data", "--follow", "get"]);
    assert_eq!(
        body,
        json!({"method": "GET", "url": "https://api.example.com/volumes/data"})
    );
}

#[test]
fn test_run_follows_link_with_extra_parameters() {
    let body = stdout_json(&[
        "run",
        "create-volume",
        "data",
        "--follow",
        "list",
        "--link-param",
        "limit=5",
    ]);
    assert_eq!(
        body,
        json!({"method": "GET", "url": "https://api.example.com/volumes?limit=5"})
    );
}

#[test]
fn test_unknown_link_is_reported() {
    relay(&["run", "create-volume", "data", "--follow", "delete"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("has no link named 'delete'"))
        .stderr(predicate::str::contains("relay links create-volume"));
}

#[test]
fn test_missing_required_flag_is_a_usage_error() {
    relay(&["run", "create-volume", "--", "--size=5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage Error"))
        .stderr(predicate::str::contains("missing required flags: --name"));
}

#[test]
fn test_invalid_value_is_a_usage_error() {
    relay(&["run", "create-volume", "data", "--type=tape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value for --type"));
}

#[test]
fn test_flag_help_sentinel_prints_help() {
    relay(&["run", "create-volume", "data", "--size=help"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("--size <integer>"))
        .stdout(predicate::str::contains("Default: 10"));
}

#[test]
fn test_command_help_shows_generated_flags() {
    relay(&["run", "create-volume", "data", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--type"))
        .stdout(predicate::str::contains("--follow"))
        .stdout(predicate::str::contains("relay run create-volume --name=data"));
}

#[test]
fn test_unknown_operation_lists_alternatives() {
    relay(&["run", "delete-volume"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("operation 'delete-volume' not found"))
        .stderr(predicate::str::contains("create-volume, get-volume, list"));
}

#[test]
fn test_json_errors() {
    let output = relay(&["--json-errors", "run", "create-volume"]).output().unwrap();
    assert!(!output.status.success());
    let error: Value = serde_json::from_slice(&output.stderr).unwrap();
    assert_eq!(error["error_type"], "Usage");
}

#[test]
fn test_links_are_described() {
    let links = stdout_json(&["links", "create-volume"]);
    let names: Vec<&str> = links
        .as_array()
        .unwrap()
        .iter()
        .map(|link| link["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["get", "list"]);
    assert_eq!(links[0]["target"], "get-volume");
    assert_eq!(links[1]["target"], "list");
}

#[test]
fn test_complete_enum_values() {
    relay(&["complete", "create-volume", "--", "--type", "ss"])
        .assert()
        .success()
        .stdout("ssd\nssd-fast\n:4\n");
}

#[test]
fn test_complete_positional_active_help() {
    relay(&["complete", "create-volume", ""])
        .assert()
        .success()
        .stdout("_activeHelp_ name (Volume name)\n:4\n");
}

#[test]
fn test_config_from_environment() {
    let body = stdout_json_with_env(&["run", "list"], &[("RELAY_ZONE", "br-ne1-a")]);
    assert_eq!(body["headers"], json!({"X-Zone": "br-ne1-a"}));
}

#[test]
fn test_explicit_flag_beats_environment() {
    let body = stdout_json_with_env(&["run", "list", "--", "--zone", "br-ne1-b"], &[("RELAY_ZONE", "br-ne1-a")]);
    assert_eq!(body["headers"], json!({"X-Zone": "br-ne1-b"}));
}

#[test]
fn test_config_file_supplies_catalog_and_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        format!(
            "catalog = {:?}\n\n[defaults]\nzone = \"br-se1-c\"\n",
            catalog_path().display().to_string()
        ),
    )
    .unwrap();

    let output = relay_cmd()
        .env("RELAY_CONFIG_DIR", dir.path())
        .env_remove("RELAY_ZONE")
        .args(["run", "list", "--", "--limit", "2"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let body: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["url"], "https://api.example.com/volumes?limit=2");
    assert_eq!(body["headers"], json!({"X-Zone": "br-se1-c"}));
}

#[test]
fn test_missing_catalog_is_reported() {
    relay_cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no operation catalog configured"));
}

fn stdout_json_with_env(args: &[&str], env: &[(&str, &str)]) -> Value {
    let mut cmd = relay(args);
    for (key, value) in env {
        cmd.env(key, value);
    }
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    serde_json::from_slice(&output.stdout).unwrap()
}
