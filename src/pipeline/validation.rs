// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Pipeline validation
//!
//! Every check runs and errors accumulate; nothing is repaired. Callers must
//! refuse to persist while `is_valid()` is false and show all errors.

use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::errors::RecoverySuggestion;
use crate::graph::{Graph, NodeRole};
use crate::pipeline::{Pipeline, StepDag};

/// Structural validator for edited graphs
pub struct GraphValidator;

impl GraphValidator {
    /// Validate a graph
    pub fn validate(graph: &Graph) -> ValidationResult {
        let mut result = ValidationResult::new();

        let starts: Vec<&str> = graph.start_nodes().map(|n| n.id.as_str()).collect();
        let ends: Vec<&str> = graph.end_nodes().map(|n| n.id.as_str()).collect();
        let has_steps = graph.step_nodes().next().is_some();

        match starts.len() {
            1 => {}
            0 => result.add_error_with(
                "Pipeline has no Start node",
                RecoverySuggestion::add_terminal("start"),
            ),
            n => result.add_error(&format!(
                "Pipeline has {} Start nodes ({}); expected exactly one",
                n,
                starts.join(", ")
            )),
        }

        match ends.len() {
            1 => {}
            0 => result.add_error_with(
                "Pipeline has no End node",
                RecoverySuggestion::add_terminal("end"),
            ),
            n => result.add_error(&format!(
                "Pipeline has {} End nodes ({}); expected exactly one",
                n,
                ends.join(", ")
            )),
        }

        if !has_steps {
            result.add_error_with("Pipeline has no steps", RecoverySuggestion::add_steps());
        } else {
            let start_ids: HashSet<&str> = starts.iter().copied().collect();
            let end_ids: HashSet<&str> = ends.iter().copied().collect();

            if !graph.edges().iter().any(|e| start_ids.contains(e.source.as_str())) {
                result.add_error_with(
                    "No step is connected to the Start node",
                    RecoverySuggestion::connect_terminal("start"),
                );
            }
            if !graph.edges().iter().any(|e| end_ids.contains(e.target.as_str())) {
                result.add_error_with(
                    "No step is connected to the End node",
                    RecoverySuggestion::connect_terminal("end"),
                );
            }
        }

        let mut ids = HashSet::new();
        let mut duplicates = Vec::new();
        for node in graph.nodes() {
            if !ids.insert(node.id.as_str()) && !duplicates.contains(&node.id.as_str()) {
                duplicates.push(node.id.as_str());
            }
        }
        for id in duplicates {
            result.add_error(&format!("Duplicate node id '{}'", id));
        }

        if let Some(report) = StepDag::from_graph(graph).cycle_report() {
            let members = report.members();
            result.add_error_with(
                &report.to_string(),
                RecoverySuggestion::fix_circular_dependency(&members),
            );
        }

        Self::check_edges(graph, &mut result);
        Self::check_reachability(graph, &mut result);

        tracing::debug!(
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "validated graph"
        );

        result
    }

    fn check_edges(graph: &Graph, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for edge in graph.edges() {
            for id in [&edge.source, &edge.target] {
                if !graph.contains_node(id) {
                    result.add_warning(&format!(
                        "Edge '{}' references unknown node '{}'",
                        edge.id, id
                    ));
                }
            }

            if !seen.insert((edge.source.as_str(), edge.target.as_str())) {
                result.add_warning(&format!(
                    "Duplicate edge '{}' from '{}' to '{}'",
                    edge.id, edge.source, edge.target
                ));
            }

            if graph.node(&edge.target).map(|n| n.role()) == Some(NodeRole::Start) {
                result.add_warning(&format!("Edge '{}' points into the Start node", edge.id));
            }
            if graph.node(&edge.source).map(|n| n.role()) == Some(NodeRole::End) {
                result.add_warning(&format!("Edge '{}' leaves the End node", edge.id));
            }
        }
    }

    /// Warn about steps cut off from Start or End
    fn check_reachability(graph: &Graph, result: &mut ValidationResult) {
        let mut forward: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut backward: HashMap<&str, Vec<&str>> = HashMap::new();
        for edge in graph.edges() {
            forward
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
            backward
                .entry(edge.target.as_str())
                .or_default()
                .push(edge.source.as_str());
        }

        let from_start = reachable(graph.start_nodes().map(|n| n.id.as_str()), &forward);
        let to_end = reachable(graph.end_nodes().map(|n| n.id.as_str()), &backward);

        for node in graph.step_nodes() {
            if !from_start.contains(node.id.as_str()) {
                result.add_warning(&format!(
                    "Step '{}' is not reachable from the Start node",
                    node.id
                ));
            }
            if !to_end.contains(node.id.as_str()) {
                result.add_warning(&format!(
                    "Step '{}' has no path to the End node",
                    node.id
                ));
            }
        }
    }
}

fn reachable<'a>(
    roots: impl Iterator<Item = &'a str>,
    adjacency: &HashMap<&'a str, Vec<&'a str>>,
) -> HashSet<&'a str> {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut queue: VecDeque<&str> = roots.collect();

    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        if let Some(next) = adjacency.get(id) {
            queue.extend(next.iter().copied());
        }
    }

    visited
}

/// Validator for declarative pipeline definitions
pub struct PipelineValidator;

impl PipelineValidator {
    /// Validate a pipeline definition
    pub fn validate(pipeline: &Pipeline) -> ValidationResult {
        let mut result = ValidationResult::new();

        if pipeline.steps.is_empty() {
            result.add_error_with("Pipeline has no steps", RecoverySuggestion::add_steps());
        }

        let mut seen_ids = HashSet::new();
        for step in &pipeline.steps {
            if step.id.is_empty() {
                result.add_error("Step with an empty id");
            } else if !seen_ids.insert(step.id.as_str()) {
                result.add_error(&format!("Duplicate step id: '{}'", step.id));
            }

            if step.name.trim().is_empty() {
                result.add_warning(&format!("Step '{}' has no name", step.id));
            }
        }

        let known: HashSet<&str> = pipeline.steps.iter().map(|s| s.id.as_str()).collect();
        for step in &pipeline.steps {
            for dep in &step.dependencies {
                if *dep == step.id {
                    result.add_error(&format!("Step '{}' depends on itself", step.id));
                } else if !known.contains(dep.as_str()) {
                    result.add_error(&format!(
                        "Step '{}' depends on unknown step '{}'",
                        step.id, dep
                    ));
                }
            }
        }

        // Self-dependencies are reported above
        let mut dag = StepDag::new();
        for step in &pipeline.steps {
            dag.add_step(&step.id);
        }
        for step in &pipeline.steps {
            for dep in step.dependencies.iter().filter(|d| **d != step.id) {
                dag.add_dependency(dep, &step.id);
            }
        }
        if let Some(report) = dag.cycle_report() {
            let members = report.members();
            result.add_error_with(
                &report.to_string(),
                RecoverySuggestion::fix_circular_dependency(&members),
            );
        }

        for (channel, sources) in [
            ("table", &pipeline.output.table_sources),
            ("reply", &pipeline.output.reply_sources),
        ] {
            for source in sources {
                if !known.contains(source.as_str()) {
                    result.add_error(&format!(
                        "Output channel '{}' references unknown step '{}'",
                        channel, source
                    ));
                }
            }
        }

        result
    }
}

/// Result of validation
#[derive(Debug, Default, Clone, Serialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    #[serde(skip)]
    pub suggestions: Vec<RecoverySuggestion>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    /// Record an error together with a way to fix it
    pub fn add_error_with(&mut self, message: &str, suggestion: RecoverySuggestion) {
        self.add_error(message);
        self.suggestions.push(suggestion);
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
