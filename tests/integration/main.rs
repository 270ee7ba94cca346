//! Integration tests for Flowmap
//!
//! These tests drive the `flowmap` binary against snapshot files on disk.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn flowmap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_flowmap"))
        .args(args)
        .output()
        .expect("Failed to execute flowmap")
}

fn stdout_json(output: &Output) -> Value {
    assert!(
        output.status.success(),
        "flowmap failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is not JSON")
}

fn write_snapshot(dir: &TempDir, name: &str, snapshot: &Value) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, serde_json::to_string_pretty(snapshot).unwrap()).unwrap();
    path
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn user_post_snapshot() -> Value {
    json!({
        "nodes": {
            "model_user": { "id": "model_user", "name": "User", "type": "model" },
            "model_post": { "id": "model_post", "name": "Post", "type": "model" }
        },
        "edges": [
            { "from": "model_post", "to": "model_user", "type": "belongs_to" }
        ]
    })
}

fn users_api_snapshot() -> Value {
    json!({
        "nodes": {
            "route_get_api_v1_users_id": {
                "id": "route_get_api_v1_users_id",
                "name": "GET /api/v1/users/:id",
                "type": "route",
                "attributes": { "path": "/api/v1/users/:id", "verb": "GET" }
            },
            "action_users_show": { "id": "action_users_show", "name": "show", "type": "action" },
            "controller_users": { "id": "controller_users", "name": "UsersController", "type": "controller" },
            "model_user": { "id": "model_user", "name": "User", "type": "model" },
            "model_audit_log": { "id": "model_audit_log", "name": "AuditLog", "type": "model" }
        },
        "edges": [
            { "from": "route_get_api_v1_users_id", "to": "action_users_show", "type": "routes_to" },
            { "from": "controller_users", "to": "action_users_show", "type": "has_action" },
            { "from": "action_users_show", "to": "model_user", "type": "accesses_model" }
        ]
    })
}

#[test]
fn test_cli_help() {
    let output = flowmap(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("diff"));
    assert!(stdout.contains("extract"));
    assert!(stdout.contains("analyze"));
}

#[test]
fn test_version() {
    let output = flowmap(&["version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_diff_removed_node_is_reported() {
    let dir = TempDir::new().unwrap();
    let before = write_snapshot(&dir, "before.json", &user_post_snapshot());
    let after = write_snapshot(
        &dir,
        "after.json",
        &json!({
            "nodes": { "model_user": { "id": "model_user", "name": "User", "type": "model" } },
            "edges": []
        }),
    );

    let diff = stdout_json(&flowmap(&["diff", "--before", arg(&before), "--after", arg(&after)]));

    assert_eq!(diff["removed_nodes"].as_array().unwrap().len(), 1);
    assert_eq!(diff["removed_nodes"][0]["name"], "Post");
    assert_eq!(diff["removed_edges"].as_array().unwrap().len(), 1);
    assert_eq!(diff["metrics_change"]["nodes"]["change"], -1);
    assert_eq!(diff["summary"]["total_changes"], 2);
    assert_eq!(
        diff["summary"]["breaking_changes"],
        json!(["Association removed: model_post belongs_to model_user"])
    );
}

#[test]
fn test_diff_without_before_treats_everything_as_added() {
    let dir = TempDir::new().unwrap();
    let after = write_snapshot(&dir, "after.json", &user_post_snapshot());

    let diff = stdout_json(&flowmap(&["diff", "--after", arg(&after)]));

    assert_eq!(diff["added_nodes"].as_array().unwrap().len(), 2);
    assert_eq!(diff["added_edges"].as_array().unwrap().len(), 1);
    assert_eq!(diff["metrics_change"]["complexity"]["percentage"], 0.0);
}

#[test]
fn test_diff_writes_output_file() {
    let dir = TempDir::new().unwrap();
    let before = write_snapshot(&dir, "before.json", &user_post_snapshot());
    let out = dir.path().join("diff.json");

    let output = flowmap(&[
        "diff",
        "--before",
        arg(&before),
        "--after",
        arg(&before),
        "--output",
        arg(&out),
    ]);
    assert!(output.status.success());
    assert!(output.stdout.is_empty());

    let diff: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(diff["summary"]["total_changes"], 0);
}

#[test]
fn test_extract_matches_route_pattern() {
    let dir = TempDir::new().unwrap();
    let graph = write_snapshot(&dir, "graph.json", &users_api_snapshot());

    let result = stdout_json(&flowmap(&["extract", arg(&graph), "/api/v1/users/123"]));

    assert_eq!(result["route"]["node_id"], "route_get_api_v1_users_id");
    assert_eq!(result["route"]["strategy"], "pattern");

    let nodes = result["graph"]["nodes"].as_object().unwrap();
    assert_eq!(nodes.len(), 4);
    assert!(nodes.contains_key("model_user"));
    assert!(!nodes.contains_key("model_audit_log"));
    assert_eq!(result["graph"]["edges"].as_array().unwrap().len(), 3);
}

#[test]
fn test_extract_without_match_fails() {
    let dir = TempDir::new().unwrap();
    let graph = write_snapshot(&dir, "graph.json", &users_api_snapshot());

    let output = flowmap(&["extract", arg(&graph), "/nothing/here"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("No route matches"));
}

#[test]
fn test_analyze_reports_cycles() {
    let dir = TempDir::new().unwrap();
    let graph = write_snapshot(
        &dir,
        "graph.json",
        &json!({
            "nodes": {
                "model_a": { "id": "model_a", "name": "A", "type": "model" },
                "model_b": { "id": "model_b", "name": "B", "type": "model" },
                "model_c": { "id": "model_c", "name": "C", "type": "model" }
            },
            "edges": [
                { "from": "model_a", "to": "model_b", "type": "has_many" },
                { "from": "model_b", "to": "model_c", "type": "has_many" },
                { "from": "model_c", "to": "model_a", "type": "belongs_to" }
            ]
        }),
    );

    let report = stdout_json(&flowmap(&["analyze", arg(&graph)]));

    assert_eq!(report["overview"]["total_nodes"], 3);
    assert_eq!(report["circular_dependencies"], json!([["A", "B", "C"]]));
}

#[test]
fn test_invalid_snapshot_is_rejected() {
    let dir = TempDir::new().unwrap();
    let graph = write_snapshot(&dir, "graph.json", &json!({ "nodes": [], "edges": [] }));

    let output = flowmap(&["analyze", arg(&graph)]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Cannot load graph snapshot"));
}

#[test]
fn test_config_thresholds_are_applied() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("flowmap.toml");
    std::fs::write(&config, "[diff]\nlarge_change_nodes = 1\n").unwrap();
    let after = write_snapshot(&dir, "after.json", &user_post_snapshot());

    let diff = stdout_json(&flowmap(&["--config", arg(&config), "diff", "--after", arg(&after)]));

    let recommendations = diff["summary"]["recommendations"].as_array().unwrap();
    assert!(
        recommendations
            .iter()
            .any(|r| r == "Consider breaking down the changes into smaller changesets")
    );
}
