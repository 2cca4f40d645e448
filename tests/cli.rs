//! End-to-end tests for the `synth` binary.

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SCHEMA: &str = "tests/fixtures/sessions.yaml";

fn synth(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_synth"))
        .args(args)
        .output()
        .expect("Failed to run synth")
}

fn lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn test_writes_json_lines_for_every_table() {
    let output = synth(&["--schema", SCHEMA, "--count", "5"]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let records = lines(&output);
    assert_eq!(records.len(), 10);

    let visit = &records[0];
    for key in ["visit_id", "user", "domain", "rev_domain", "time", "timestamp_ms", "bytes"] {
        assert!(visit.get(key).is_some(), "missing {key} in {visit}");
    }
    assert!(records[5].get("tags").unwrap().is_array());
}

#[test]
fn test_same_seed_same_output() {
    let a = synth(&["--schema", SCHEMA, "--table", "visits", "--count", "50"]);
    let b = synth(&["--schema", SCHEMA, "--table", "visits", "--count", "50"]);
    let c = synth(&[
        "--schema", SCHEMA, "--table", "visits", "--count", "50", "--seed", "7",
    ]);
    assert!(a.status.success() && b.status.success() && c.status.success());
    assert_eq!(a.stdout, b.stdout);
    assert_ne!(a.stdout, c.stdout);
}

#[test]
fn test_output_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hosts.jsonl");
    let output = synth(&[
        "--schema",
        SCHEMA,
        "--table",
        "hosts",
        "--count",
        "3",
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let content = std::fs::read_to_string(&path).unwrap();
    let ids: Vec<i64> = content
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["id"].as_i64().unwrap()
        })
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn test_unknown_table_fails() {
    let output = synth(&["--schema", SCHEMA, "--table", "nope"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"), "{stderr}");
    assert!(stderr.contains("nope"), "{stderr}");
}

#[test]
fn test_invalid_schema_fails_before_output() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yaml");
    std::fs::write(
        &path,
        "tables:\n  - name: t\n    fields:\n      - name: w\n        generator:\n          type: word\n          alpha: -1\n",
    )
    .unwrap();

    let output = synth(&["--schema", path.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("alpha"));
}

#[test]
fn test_missing_schema_file_fails() {
    let output = synth(&["--schema", "/nonexistent/schema.yaml"]);
    assert!(!output.status.success());
    assert!(!Path::new("/nonexistent/schema.yaml").exists());
}
