// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DIAMOND: &str = r#"
id: "triage"
name: "Support triage"
description: "Extract facts and tone, then answer"
steps:
  - id: facts
    name: Facts
    type: extract
    model: fast
  - id: tone
    name: Tone
    type: extract
  - id: answer
    name: Answer
    type: reply
    context_from: [facts, tone]
"#;

const CYCLE: &str = r#"
id: "loop"
name: "Loop"
steps:
  - id: a
    name: A
    type: extract
    context_from: [b]
  - id: b
    name: B
    type: reply
    context_from: [a]
"#;

fn stepgraph() -> Command {
    let mut cmd = Command::cargo_bin("stepgraph").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn graph_json(pipeline: &Path) -> serde_json::Value {
    let output = stepgraph()
        .arg("graph")
        .arg(pipeline)
        .args(["--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn validate_accepts_valid_pipeline() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "pipeline.yaml", DIAMOND);

    stepgraph()
        .arg("validate")
        .arg(&pipeline)
        .assert()
        .success()
        .stdout(predicate::str::contains("Pipeline is valid!"));
}

#[test]
fn validate_rejects_cycle_and_lists_errors() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "loop.yaml", CYCLE);

    stepgraph()
        .arg("validate")
        .arg(&pipeline)
        .assert()
        .failure()
        .stdout(predicate::str::contains("cycle"))
        .stdout(predicate::str::contains("Start node"));
}

#[test]
fn validate_json_output() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "loop.yaml", CYCLE);

    let output = stepgraph()
        .args(["validate", "--format", "json"])
        .arg(&pipeline)
        .output()
        .unwrap();

    assert!(!output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(!result["errors"].as_array().unwrap().is_empty());
}

#[test]
fn validate_missing_file_fails() {
    let dir = TempDir::new().unwrap();

    stepgraph()
        .current_dir(dir.path())
        .arg("validate")
        .assert()
        .failure();
}

#[test]
fn graph_json_has_diamond_shape() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "pipeline.yaml", DIAMOND);

    let document = graph_json(&pipeline);

    let nodes = document["nodes"].as_array().unwrap();
    assert_eq!(nodes.len(), 5);
    assert_eq!(nodes[0]["type"], "start");
    assert_eq!(nodes[4]["type"], "end");

    let mut edges: Vec<(String, String)> = document["edges"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["source"].as_str().unwrap().to_string(),
                e["target"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    edges.sort();
    assert_eq!(
        edges,
        vec![
            ("answer".to_string(), "end".to_string()),
            ("facts".to_string(), "answer".to_string()),
            ("start".to_string(), "facts".to_string()),
            ("start".to_string(), "tone".to_string()),
            ("tone".to_string(), "answer".to_string()),
        ]
    );
}

#[test]
fn graph_mermaid_output() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "pipeline.yaml", DIAMOND);

    stepgraph()
        .arg("graph")
        .arg(&pipeline)
        .args(["--format", "mermaid"])
        .assert()
        .success()
        .stdout(predicate::str::contains("facts --> answer"));
}

#[test]
fn layout_config_changes_positions() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "pipeline.yaml", DIAMOND);
    let config = write(dir.path(), "layout.toml", "origin_x = 1000.0\n");

    let output = stepgraph()
        .arg("--layout-config")
        .arg(&config)
        .arg("graph")
        .arg(&pipeline)
        .output()
        .unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["nodes"][0]["position"]["x"], 1000.0);
}

#[test]
fn definition_round_trips_graph() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "pipeline.yaml", DIAMOND);
    let document = graph_json(&pipeline);
    let graph = write(dir.path(), "graph.json", &document.to_string());

    let output = stepgraph()
        .arg("definition")
        .arg(&graph)
        .args(["--id", "triage", "--name", "Support triage", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rebuilt: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rebuilt["id"], "triage");
    assert_eq!(rebuilt["steps"][2]["id"], "answer");
    assert_eq!(
        rebuilt["steps"][2]["context_from"],
        serde_json::json!(["facts", "tone"])
    );
    assert_eq!(rebuilt["steps"][0]["model"], "fast");
    assert_eq!(
        rebuilt["output"]["table_from"],
        serde_json::json!(["facts", "tone"])
    );
}

#[test]
fn definition_round_trips_step_named_end() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(
        dir.path(),
        "pipeline.yaml",
        r#"
id: "edge"
name: "Edge case"
steps:
  - id: end
    name: End
    type: extract
  - id: b
    name: B
    type: reply
    context_from: [end]
"#,
    );

    stepgraph().arg("validate").arg(&pipeline).assert().success();

    let document = graph_json(&pipeline);
    let graph = write(dir.path(), "graph.json", &document.to_string());

    let output = stepgraph()
        .arg("definition")
        .arg(&graph)
        .args(["--id", "edge", "--name", "Edge case", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let rebuilt: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rebuilt["steps"][0]["id"], "end");
    assert_eq!(rebuilt["steps"][1]["context_from"], serde_json::json!(["end"]));
}

#[test]
fn definition_refuses_invalid_graph() {
    let dir = TempDir::new().unwrap();
    let graph = write(
        dir.path(),
        "graph.json",
        r#"{"nodes": [{"id": "start", "type": "start", "position": {"x": 0, "y": 0}, "data": {}}],
            "edges": []}"#,
    );

    stepgraph()
        .arg("definition")
        .arg(&graph)
        .args(["--id", "p", "--name", "P"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Graph cannot be saved:"))
        .stderr(predicate::str::contains("no End node"))
        .stderr(predicate::str::contains("no steps"));
}

#[test]
fn layout_rewrites_positions_only() {
    let dir = TempDir::new().unwrap();
    let graph = write(
        dir.path(),
        "graph.json",
        r#"{
            "nodes": [
                {"id": "start", "type": "start", "position": {"x": 999, "y": 999}, "data": {}},
                {"id": "a", "type": "extract", "position": {"x": -5, "y": 40}, "data": {"name": "A"}},
                {"id": "end", "type": "end", "position": {"x": 1, "y": 1}, "data": {}}
            ],
            "edges": [
                {"id": "e1", "source": "start", "target": "a"},
                {"id": "e2", "source": "a", "target": "end"}
            ]
        }"#,
    );

    let output = stepgraph().arg("layout").arg(&graph).output().unwrap();
    assert!(output.status.success());

    let document: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(document["nodes"][0]["position"], serde_json::json!({"x": 0.0, "y": 0.0}));
    assert_eq!(document["nodes"][1]["position"], serde_json::json!({"x": 350.0, "y": 0.0}));
    assert_eq!(document["nodes"][2]["position"], serde_json::json!({"x": 700.0, "y": 0.0}));
    assert_eq!(document["edges"][0]["id"], "e1");
}

#[test]
fn validate_graph_document() {
    let dir = TempDir::new().unwrap();
    let graph = write(
        dir.path(),
        "graph.json",
        r#"{"nodes": [
                {"id": "start", "type": "start", "data": {}},
                {"id": "end", "type": "end", "data": {}}
            ],
            "edges": []}"#,
    );

    stepgraph()
        .args(["validate", "--graph"])
        .arg(&graph)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Pipeline has no steps"))
        .stdout(predicate::str::contains("connected to").not());
}

#[test]
fn order_prints_tiers() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "pipeline.yaml", DIAMOND);

    stepgraph()
        .arg("order")
        .arg(&pipeline)
        .assert()
        .success()
        .stdout(predicate::str::contains("level 0: facts, tone"))
        .stdout(predicate::str::contains("level 1: answer"));
}

#[test]
fn order_rejects_cycle() {
    let dir = TempDir::new().unwrap();
    let pipeline = write(dir.path(), "loop.yaml", CYCLE);

    stepgraph().arg("order").arg(&pipeline).assert().failure();
}
