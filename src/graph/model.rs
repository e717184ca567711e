// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Headless graph model
//!
//! Nodes live in an id-indexed table; edges are a plain relation of node ids
//! and own nothing. Removing a node cascades to every edge that names it.
//! Screen positions are kept out of this model (see [`crate::graph::Layout`]).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{StepgraphError, StepgraphResult};
use crate::pipeline::{ModelClass, Step, StepKind};

/// Id of the Start node created by the converters
pub const START_NODE_ID: &str = "start";

/// Id of the End node created by the converters
pub const END_NODE_ID: &str = "end";

/// Role of a node in the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    Start,
    End,
    Step,
}

/// Step fields carried by a step node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepPayload {
    pub name: String,
    pub kind: StepKind,
    pub model_class: ModelClass,
    pub prompt_override: Option<String>,
}

impl StepPayload {
    /// Copy the non-relational fields of a step
    pub fn from_step(step: &Step) -> Self {
        Self {
            name: step.name.clone(),
            kind: step.kind,
            model_class: step.model_class,
            prompt_override: step.prompt_override.clone(),
        }
    }

    /// Rebuild a step with the given id and dependencies
    pub fn to_step(&self, id: &str, dependencies: Vec<String>) -> Step {
        Step {
            id: id.to_string(),
            name: self.name.clone(),
            kind: self.kind,
            model_class: self.model_class,
            prompt_override: self.prompt_override.clone(),
            dependencies,
        }
    }
}

/// What a node is; only step nodes carry a payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Start,
    End,
    Step(StepPayload),
}

/// A graph node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub id: String,
    pub kind: NodeKind,
}

impl GraphNode {
    pub fn start(id: impl Into<String>) -> Self {
        Self { id: id.into(), kind: NodeKind::Start }
    }

    pub fn end(id: impl Into<String>) -> Self {
        Self { id: id.into(), kind: NodeKind::End }
    }

    pub fn step(step: &Step) -> Self {
        Self {
            id: step.id.clone(),
            kind: NodeKind::Step(StepPayload::from_step(step)),
        }
    }

    pub fn role(&self) -> NodeRole {
        match self.kind {
            NodeKind::Start => NodeRole::Start,
            NodeKind::End => NodeRole::End,
            NodeKind::Step(_) => NodeRole::Step,
        }
    }

    pub fn payload(&self) -> Option<&StepPayload> {
        match &self.kind {
            NodeKind::Step(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self.kind, NodeKind::Step(_))
    }
}

/// A directed edge between two node ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
}

impl GraphEdge {
    /// Edge with the conventional `e-{source}-{target}` id
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        let source = source.into();
        let target = target.into();
        Self {
            id: edge_id(&source, &target),
            source,
            target,
        }
    }
}

/// Conventional edge id for a source/target pair
pub fn edge_id(source: &str, target: &str) -> String {
    format!("e-{}-{}", source, target)
}

/// Pipeline graph: node table plus edge relation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    nodes: Vec<GraphNode>,
    edges: Vec<GraphEdge>,
    /// Node id → position in `nodes` (first occurrence wins)
    index: HashMap<String, usize>,
}

impl Graph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph holding only the Start and End nodes
    pub fn with_terminals() -> Self {
        Self::from_parts(
            vec![GraphNode::start(START_NODE_ID), GraphNode::end(END_NODE_ID)],
            vec![],
        )
    }

    /// Assemble a graph without checking it.
    ///
    /// Duplicate ids and dangling edges are kept as-is so an in-progress
    /// edit can still be loaded, validated and laid out.
    pub fn from_parts(nodes: Vec<GraphNode>, edges: Vec<GraphEdge>) -> Self {
        let mut graph = Self {
            nodes,
            edges,
            index: HashMap::new(),
        };
        graph.reindex();
        graph
    }

    fn reindex(&mut self) {
        self.index.clear();
        for (i, node) in self.nodes.iter().enumerate() {
            self.index.entry(node.id.clone()).or_insert(i);
        }
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|i| &self.nodes[*i])
    }

    /// Mutable access to a node's payload for in-place edits
    pub fn payload_mut(&mut self, id: &str) -> Option<&mut StepPayload> {
        let i = *self.index.get(id)?;
        match &mut self.nodes[i].kind {
            NodeKind::Step(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn is_step(&self, id: &str) -> bool {
        self.node(id).is_some_and(GraphNode::is_step)
    }

    pub fn start_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.role() == NodeRole::Start)
    }

    pub fn end_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.role() == NodeRole::End)
    }

    pub fn step_nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|n| n.is_step())
    }

    pub fn incoming<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.target == id)
    }

    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Add a node, rejecting a duplicate id
    pub fn add_node(&mut self, node: GraphNode) -> StepgraphResult<()> {
        if self.contains_node(&node.id) {
            return Err(StepgraphError::DuplicateNode { id: node.id });
        }
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node and every edge naming it
    pub fn remove_node(&mut self, id: &str) -> Option<GraphNode> {
        let i = *self.index.get(id)?;
        let removed = self.nodes.remove(i);
        self.edges.retain(|e| e.source != id && e.target != id);
        self.reindex();
        tracing::debug!(node = %id, "removed node and its edges");
        Some(removed)
    }

    /// Add an edge between two existing nodes; an empty edge id is filled in
    pub fn add_edge(&mut self, mut edge: GraphEdge) -> StepgraphResult<&GraphEdge> {
        for id in [&edge.source, &edge.target] {
            if !self.contains_node(id) {
                return Err(StepgraphError::UnknownNode { id: id.clone() });
            }
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == edge.source && e.target == edge.target)
        {
            return Err(StepgraphError::DuplicateEdge {
                source_id: edge.source,
                target_id: edge.target,
            });
        }
        if edge.id.is_empty() {
            edge.id = edge_id(&edge.source, &edge.target);
        }

        self.edges.push(edge);
        Ok(&self.edges[self.edges.len() - 1])
    }

    /// Add an edge with the conventional id
    pub fn connect(&mut self, source: &str, target: &str) -> StepgraphResult<&GraphEdge> {
        self.add_edge(GraphEdge::between(source, target))
    }

    /// Remove an edge by id
    pub fn remove_edge(&mut self, edge_id: &str) -> Option<GraphEdge> {
        let i = self.edges.iter().position(|e| e.id == edge_id)?;
        Some(self.edges.remove(i))
    }

    /// Id of the Start node, if there is exactly one
    pub fn start_id(&self) -> Option<&str> {
        single(self.start_nodes())
    }

    /// Id of the End node, if there is exactly one
    pub fn end_id(&self) -> Option<&str> {
        single(self.end_nodes())
    }
}

fn single<'a>(mut nodes: impl Iterator<Item = &'a GraphNode>) -> Option<&'a str> {
    let first = nodes.next()?;
    match nodes.next() {
        Some(_) => None,
        None => Some(first.id.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_graph() -> Graph {
        let mut graph = Graph::with_terminals();
        graph
            .add_node(GraphNode::step(&Step::new("a", "A", StepKind::Extract)))
            .unwrap();
        graph
            .add_node(GraphNode::step(&Step::new("b", "B", StepKind::Reply)))
            .unwrap();
        graph.connect(START_NODE_ID, "a").unwrap();
        graph.connect("a", "b").unwrap();
        graph.connect("b", END_NODE_ID).unwrap();
        graph
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut graph = sample_graph();

        let removed = graph.remove_node("a").unwrap();
        assert_eq!(removed.id, "a");
        assert!(!graph.contains_node("a"));
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].id, "e-b-end");
        // Index stays consistent after removal
        assert_eq!(graph.node("b").map(|n| n.role()), Some(NodeRole::Step));
    }

    #[test]
    fn test_add_edge_rejects_unknown_and_duplicate() {
        let mut graph = sample_graph();

        assert!(matches!(
            graph.connect("a", "ghost"),
            Err(StepgraphError::UnknownNode { id }) if id == "ghost"
        ));
        assert!(matches!(
            graph.connect("a", "b"),
            Err(StepgraphError::DuplicateEdge { .. })
        ));
    }

    #[test]
    fn test_add_node_rejects_duplicate() {
        let mut graph = sample_graph();
        let result = graph.add_node(GraphNode::end(END_NODE_ID));
        assert!(matches!(result, Err(StepgraphError::DuplicateNode { .. })));
    }

    #[test]
    fn test_add_edge_fills_missing_id() {
        let mut graph = sample_graph();
        graph.remove_edge("e-a-b").unwrap();

        let edge = graph
            .add_edge(GraphEdge {
                id: String::new(),
                source: "a".into(),
                target: "b".into(),
            })
            .unwrap();
        assert_eq!(edge.id, "e-a-b");
    }

    #[test]
    fn test_terminal_lookup() {
        let mut graph = sample_graph();
        assert_eq!(graph.start_id(), Some(START_NODE_ID));
        assert_eq!(graph.end_id(), Some(END_NODE_ID));

        graph.add_node(GraphNode::start("start-2")).unwrap();
        assert_eq!(graph.start_id(), None);
    }

    #[test]
    fn test_payload_round_trip() {
        let step = Step::new("s", "Summarize", StepKind::ExtractAndReply)
            .with_model(ModelClass::Vision)
            .with_prompt("Summarize the image");
        let node = GraphNode::step(&step);

        let rebuilt = node.payload().unwrap().to_step("s", vec![]);
        assert_eq!(rebuilt, step);
        assert!(GraphNode::start("x").payload().is_none());
    }

    #[test]
    fn test_payload_mut_edits_step_only() {
        let mut graph = sample_graph();

        graph.payload_mut("a").unwrap().kind = StepKind::Reply;
        assert_eq!(graph.node("a").unwrap().payload().unwrap().kind, StepKind::Reply);
        assert!(graph.payload_mut(START_NODE_ID).is_none());
        assert!(graph.payload_mut("ghost").is_none());
    }
}
