//! Binary-level tests: JSON in, JSON out
//!
//! Only paths that make no AWS calls are exercised here (manifest and
//! Delete events).

use serde_json::{Value, json};
use std::io::Write;
use std::process::{Command, Output};

fn provider_cmd() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lifecycle-provider"));
    cmd.env_remove("LIFECYCLE_OPERATION_KIND")
        .env_remove("LIFECYCLE_TIMEOUT_SECS")
        .env_remove("LIFECYCLE_MEMORY_MB")
        .env("AWS_REGION", "us-east-1")
        .env("RUST_LOG", "warn");
    cmd
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "provider failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be a single JSON document")
}

fn event_file(event: Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{}", event).unwrap();
    file
}

#[test]
fn test_manifest_defaults() {
    let output = provider_cmd().args(["--kind", "agent", "manifest"]).output().unwrap();
    let manifest = stdout_json(&output);

    assert_eq!(manifest["Kind"], "agent");
    assert_eq!(manifest["OnEvent"]["TimeoutSecs"], 900);
    assert_eq!(manifest["OnEvent"]["MemoryMb"], 1024);
    assert_eq!(manifest["TotalTimeoutSecs"], 1800);
    assert_eq!(manifest["Policy"]["Statement"].as_array().unwrap().len(), 3);
}

#[test]
fn test_manifest_overrides() {
    let output = provider_cmd()
        .args(["manifest", "--timeout-secs", "300", "--memory-mb", "512"])
        .output()
        .unwrap();
    let manifest = stdout_json(&output);

    assert_eq!(manifest["Kind"], "build");
    assert_eq!(manifest["IsComplete"]["TimeoutSecs"], 300);
    assert_eq!(manifest["IsComplete"]["MemoryMb"], 512);
}

#[test]
fn test_invalid_limits_rejected() {
    let output = provider_cmd()
        .args(["manifest", "--timeout-secs", "3600"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_delete_event_round_trip() {
    let event = event_file(json!({
        "RequestType": "Delete",
        "LogicalResourceId": "FrontendBuild",
        "PhysicalResourceId": "proj-1:build-42",
        "ResourceProperties": {"ProjectName": "proj-1"}
    }));

    let output = provider_cmd()
        .arg("on-event")
        .arg("--input")
        .arg(event.path())
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output), json!({}));

    let output = provider_cmd()
        .arg("is-complete")
        .arg("--input")
        .arg(event.path())
        .output()
        .unwrap();
    assert_eq!(stdout_json(&output), json!({"IsComplete": true}));
}

#[test]
fn test_unparseable_event_fails() {
    let event = event_file(json!({"RequestType": "Restart"}));
    let output = provider_cmd()
        .arg("on-event")
        .arg("--input")
        .arg(event.path())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to parse lifecycle event"));
}
