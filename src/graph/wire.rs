// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Graph interchange format
//!
//! The editing surface exchanges a single JSON document in which each node
//! carries its own position. [`GraphDocument`] merges a headless [`Graph`]
//! with its [`Layout`] for the wire and splits them apart again on read.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::{StepgraphError, StepgraphResult};
use crate::graph::{edge_id, Graph, GraphEdge, GraphNode, Layout, NodeKind, Position, StepPayload};
use crate::pipeline::{ModelClass, StepKind};

/// Node type tag used on the wire; step kinds double as node types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Start,
    End,
    Extract,
    Reply,
    ExtractAndReply,
}

impl NodeType {
    fn step_kind(self) -> Option<StepKind> {
        match self {
            Self::Start | Self::End => None,
            Self::Extract => Some(StepKind::Extract),
            Self::Reply => Some(StepKind::Reply),
            Self::ExtractAndReply => Some(StepKind::ExtractAndReply),
        }
    }
}

impl From<StepKind> for NodeType {
    fn from(kind: StepKind) -> Self {
        match kind {
            StepKind::Extract => Self::Extract,
            StepKind::Reply => Self::Reply,
            StepKind::ExtractAndReply => Self::ExtractAndReply,
        }
    }
}

/// Step fields of a node; empty for Start/End
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelClass>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
}

/// A positioned node as exchanged with the editor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub id: String,

    #[serde(rename = "type")]
    pub node_type: NodeType,

    #[serde(default)]
    pub position: Position,

    #[serde(default)]
    pub data: NodeData,
}

/// Graph document exchanged with the editing surface
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<WireNode>,

    #[serde(default)]
    pub edges: Vec<GraphEdge>,
}

impl GraphDocument {
    /// Merge a graph with its position sidecar; unplaced nodes sit at (0, 0)
    pub fn from_graph(graph: &Graph, layout: &Layout) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| {
                let (node_type, data) = match &node.kind {
                    NodeKind::Start => (NodeType::Start, NodeData::default()),
                    NodeKind::End => (NodeType::End, NodeData::default()),
                    NodeKind::Step(payload) => (
                        NodeType::from(payload.kind),
                        NodeData {
                            name: Some(payload.name.clone()),
                            model: Some(payload.model_class),
                            prompt_template: payload.prompt_override.clone(),
                        },
                    ),
                };
                WireNode {
                    id: node.id.clone(),
                    node_type,
                    position: layout.position_or_default(&node.id),
                    data,
                }
            })
            .collect();

        Self {
            nodes,
            edges: graph.edges().to_vec(),
        }
    }

    /// Split into a headless graph and its position sidecar.
    ///
    /// Never fails: a step node without a name falls back to its id, and
    /// an edge without an id gets the conventional one.
    pub fn into_parts(self) -> (Graph, Layout) {
        let mut layout = Layout::new();
        let nodes = self
            .nodes
            .into_iter()
            .map(|wire| {
                layout.set(wire.id.clone(), wire.position);
                let kind = match wire.node_type.step_kind() {
                    None if wire.node_type == NodeType::Start => NodeKind::Start,
                    None => NodeKind::End,
                    Some(kind) => NodeKind::Step(StepPayload {
                        name: wire.data.name.unwrap_or_else(|| wire.id.clone()),
                        kind,
                        model_class: wire.data.model.unwrap_or_default(),
                        prompt_override: wire.data.prompt_template,
                    }),
                };
                GraphNode { id: wire.id, kind }
            })
            .collect();

        let edges = self
            .edges
            .into_iter()
            .map(|mut edge| {
                if edge.id.is_empty() {
                    edge.id = edge_id(&edge.source, &edge.target);
                }
                edge
            })
            .collect();

        (Graph::from_parts(nodes, edges), layout)
    }

    /// Load a graph document from a JSON file
    pub fn from_file(path: &Path) -> StepgraphResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StepgraphError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> StepgraphResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    pub fn to_json(&self) -> StepgraphResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{NodeRole, END_NODE_ID, START_NODE_ID};

    const EDITOR_JSON: &str = r#"{
        "nodes": [
            {"id": "start", "type": "start", "position": {"x": 0, "y": 0}, "data": {}},
            {"id": "read", "type": "extract", "position": {"x": 350, "y": 0},
             "data": {"name": "Read invoice", "model": "vision"}},
            {"id": "answer", "type": "reply", "position": {"x": 700, "y": 10},
             "data": {"prompt_template": "Be brief"}},
            {"id": "end", "type": "end", "position": {"x": 1050, "y": 0}, "data": {}}
        ],
        "edges": [
            {"id": "e1", "source": "start", "target": "read"},
            {"source": "read", "target": "answer"},
            {"id": "e3", "source": "answer", "target": "end"}
        ]
    }"#;

    #[test]
    fn test_split_editor_document() {
        let (graph, layout) = GraphDocument::from_json(EDITOR_JSON).unwrap().into_parts();

        assert_eq!(graph.nodes().len(), 4);
        assert_eq!(graph.node(START_NODE_ID).map(|n| n.role()), Some(NodeRole::Start));
        assert_eq!(graph.node(END_NODE_ID).map(|n| n.role()), Some(NodeRole::End));

        let read = graph.node("read").and_then(|n| n.payload()).unwrap();
        assert_eq!(read.name, "Read invoice");
        assert_eq!(read.model_class, ModelClass::Vision);

        let answer = graph.node("answer").and_then(|n| n.payload()).unwrap();
        assert_eq!(answer.name, "answer");
        assert_eq!(answer.model_class, ModelClass::Default);
        assert_eq!(answer.prompt_override.as_deref(), Some("Be brief"));

        assert_eq!(graph.edges()[1].id, "e-read-answer");
        assert_eq!(layout.get("answer"), Some(Position::new(700.0, 10.0)));
    }

    #[test]
    fn test_terminals_serialize_with_empty_data() {
        let (graph, layout) = GraphDocument::from_json(EDITOR_JSON).unwrap().into_parts();
        let json = GraphDocument::from_graph(&graph, &layout).to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["nodes"][0]["type"], "start");
        assert_eq!(value["nodes"][0]["data"], serde_json::json!({}));
        assert_eq!(value["nodes"][1]["data"]["model"], "vision");
        assert_eq!(value["nodes"][3]["position"]["x"], 1050.0);
    }

    #[test]
    fn test_dangling_edges_survive_decoding() {
        let json = r#"{"nodes": [], "edges": [{"id": "x", "source": "a", "target": "b"}]}"#;
        let (graph, layout) = GraphDocument::from_json(json).unwrap().into_parts();

        assert!(graph.nodes().is_empty());
        assert_eq!(graph.edges().len(), 1);
        assert!(layout.is_empty());
    }
}
