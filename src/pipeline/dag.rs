// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! DAG (Directed Acyclic Graph) of step dependencies
//!
//! Steps are stored in a petgraph `DiGraph` whose node indices follow declared
//! order. Ordering, levelling and cycle detection all run Kahn's algorithm
//! over that adjacency: whatever is left once no zero-indegree node remains
//! is the cyclic remainder. Every operation is total, so a half-edited graph
//! with a cycle or a dangling reference still yields finite results.

use petgraph::algo::{has_path_connecting, tarjan_scc};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use crate::errors::StepgraphError;
use crate::graph::Graph;
use crate::pipeline::Pipeline;

/// Dependency graph over step ids
#[derive(Debug, Clone, Default)]
pub struct StepDag {
    /// Edge direction: dependency → dependent
    graph: DiGraph<String, ()>,
    id_to_index: HashMap<String, NodeIndex>,
}

/// Steps that could not be ordered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// Every unprocessed step, in declared order
    pub remainder: Vec<String>,
    /// Strongly connected components that actually form cycles
    pub cycles: Vec<Vec<String>>,
}

impl CycleReport {
    /// Steps that sit on a cycle, in declared order
    pub fn members(&self) -> Vec<String> {
        let mut members: Vec<String> = self.cycles.iter().flatten().cloned().collect();
        members.sort_by_key(|id| self.remainder.iter().position(|r| r == id));
        members
    }
}

impl std::fmt::Display for CycleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cycles: Vec<String> = self
            .cycles
            .iter()
            .map(|cycle| {
                let mut path = cycle.clone();
                if let Some(first) = cycle.first() {
                    path.push(first.clone());
                }
                path.join(" → ")
            })
            .collect();
        write!(f, "Dependency cycle detected: {}", cycles.join("; "))
    }
}

struct KahnOutcome {
    order: Vec<NodeIndex>,
    remainder: Vec<NodeIndex>,
}

impl StepDag {
    /// Create an empty DAG
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from declared step dependencies; unknown dependencies are skipped
    pub fn from_pipeline(pipeline: &Pipeline) -> Self {
        let mut dag = Self::new();

        for step in &pipeline.steps {
            dag.add_step(&step.id);
        }
        for step in &pipeline.steps {
            for dep in &step.dependencies {
                if !dag.add_dependency(dep, &step.id) {
                    tracing::debug!(step = %step.id, dependency = %dep, "skipping unknown dependency");
                }
            }
        }

        dag
    }

    /// Build from a graph's step nodes and step-to-step edges
    pub fn from_graph(graph: &Graph) -> Self {
        let mut dag = Self::new();

        for node in graph.step_nodes() {
            dag.add_step(&node.id);
        }
        for edge in graph.edges() {
            // Only step-to-step edges; terminals and dangling ids are skipped
            if graph.is_step(&edge.source) && graph.is_step(&edge.target) {
                dag.add_dependency(&edge.source, &edge.target);
            }
        }

        dag
    }

    /// Add a step; adding an existing id is a no-op
    pub fn add_step(&mut self, id: &str) -> NodeIndex {
        if let Some(index) = self.id_to_index.get(id) {
            return *index;
        }
        let index = self.graph.add_node(id.to_string());
        self.id_to_index.insert(id.to_string(), index);
        index
    }

    /// Record that `step` consumes `dependency`. Returns false when either
    /// id is unknown. Self-dependencies are kept so they surface as cycles.
    pub fn add_dependency(&mut self, dependency: &str, step: &str) -> bool {
        let (Some(&from), Some(&to)) = (self.id_to_index.get(dependency), self.id_to_index.get(step))
        else {
            return false;
        };
        if !self.graph.contains_edge(from, to) {
            self.graph.add_edge(from, to, ());
        }
        true
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_to_index.contains_key(id)
    }

    fn kahn(&self) -> KahnOutcome {
        let count = self.graph.node_count();
        let mut indegree: Vec<usize> = self
            .graph
            .node_indices()
            .map(|n| self.graph.edges_directed(n, Direction::Incoming).count())
            .collect();

        // Min-heap on declared index keeps ties in declared order
        let mut ready: BinaryHeap<Reverse<usize>> = indegree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| Reverse(i))
            .collect();

        let mut processed = vec![false; count];
        let mut order = Vec::with_capacity(count);

        while let Some(Reverse(i)) = ready.pop() {
            let node = NodeIndex::new(i);
            processed[i] = true;
            order.push(node);

            for next in self.graph.neighbors_directed(node, Direction::Outgoing) {
                let degree = &mut indegree[next.index()];
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.push(Reverse(next.index()));
                }
            }
        }

        let remainder = (0..count)
            .filter(|i| !processed[*i])
            .map(NodeIndex::new)
            .collect();

        KahnOutcome { order, remainder }
    }

    /// Whether the dependency relation contains a cycle
    pub fn has_cycle(&self) -> bool {
        !self.kahn().remainder.is_empty()
    }

    /// Describe the cyclic remainder, or `None` when acyclic
    pub fn cycle_report(&self) -> Option<CycleReport> {
        let outcome = self.kahn();
        if outcome.remainder.is_empty() {
            return None;
        }

        let mut cycles: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|n| self.graph.contains_edge(*n, *n))
            })
            .map(|mut component| {
                component.sort();
                component
            })
            .collect();
        cycles.sort();

        Some(CycleReport {
            remainder: self.names(&outcome.remainder),
            cycles: cycles.iter().map(|c| self.names(c)).collect(),
        })
    }

    fn names(&self, nodes: &[NodeIndex]) -> Vec<String> {
        nodes.iter().map(|n| self.graph[*n].clone()).collect()
    }

    /// Longest dependency chain ending at each step.
    ///
    /// Steps in a cyclic remainder get one more than their highest already
    /// levelled predecessor, so the result is finite but not meaningful for
    /// them.
    pub fn levels(&self) -> HashMap<String, usize> {
        let outcome = self.kahn();
        let mut levels: Vec<Option<usize>> = vec![None; self.graph.node_count()];

        for node in outcome.order.iter().chain(&outcome.remainder) {
            let level = self
                .graph
                .neighbors_directed(*node, Direction::Incoming)
                .filter_map(|pred| levels[pred.index()])
                .max()
                .map_or(0, |max| max + 1);
            levels[node.index()] = Some(level);
        }

        self.graph
            .node_indices()
            .map(|n| (self.graph[n].clone(), levels[n.index()].unwrap_or(0)))
            .collect()
    }

    /// Highest level, or `None` for an empty DAG
    pub fn max_level(&self) -> Option<usize> {
        self.levels().into_values().max()
    }

    /// Dependency-respecting order; the cyclic remainder, if any, is appended
    /// in declared order
    pub fn topological_order(&self) -> Vec<String> {
        let outcome = self.kahn();
        outcome
            .order
            .iter()
            .chain(&outcome.remainder)
            .map(|n| self.graph[*n].clone())
            .collect()
    }

    /// Like `topological_order`, but refuses cyclic input
    pub fn checked_order(&self) -> Result<Vec<String>, StepgraphError> {
        match self.cycle_report() {
            Some(report) => Err(StepgraphError::CircularDependency {
                steps: report.members(),
            }),
            None => Ok(self.topological_order()),
        }
    }

    /// Steps grouped by level, each tier in declared order.
    ///
    /// Every step in tier L depends only on steps in earlier tiers, so a tier
    /// may run concurrently once all earlier tiers have completed.
    pub fn execution_tiers(&self) -> Vec<Vec<String>> {
        let levels = self.levels();
        let mut tiers: Vec<Vec<String>> = Vec::new();

        for node in self.graph.node_indices() {
            let id = &self.graph[node];
            let level = levels.get(id).copied().unwrap_or(0);
            if tiers.len() <= level {
                tiers.resize_with(level + 1, Vec::new);
            }
            tiers[level].push(id.clone());
        }

        tiers
    }

    /// Get dependencies for a step (steps that must run before it)
    pub fn dependencies(&self, step_id: &str) -> Option<Vec<String>> {
        self.neighbors(step_id, Direction::Incoming)
    }

    /// Get dependents for a step (steps that consume it)
    pub fn dependents(&self, step_id: &str) -> Option<Vec<String>> {
        self.neighbors(step_id, Direction::Outgoing)
    }

    fn neighbors(&self, step_id: &str, direction: Direction) -> Option<Vec<String>> {
        let node = self.id_to_index.get(step_id)?;
        let mut found: Vec<NodeIndex> = self.graph.neighbors_directed(*node, direction).collect();
        found.sort();
        Some(self.names(&found))
    }

    /// Check if step A depends (directly or transitively) on step B
    pub fn depends_on(&self, step_a: &str, step_b: &str) -> bool {
        let Some(node_a) = self.id_to_index.get(step_a) else {
            return false;
        };
        let Some(node_b) = self.id_to_index.get(step_b) else {
            return false;
        };
        if node_a == node_b {
            return self.graph.contains_edge(*node_a, *node_a);
        }

        has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    /// Generate Mermaid diagram of the DAG
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph LR\n");

        for node in self.graph.node_indices() {
            let name = &self.graph[node];
            out.push_str(&format!("    {}[{}]\n", name, name));
        }

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    {} --> {}\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for edge in self.graph.edge_references() {
            out.push_str(&format!(
                "    \"{}\" -> \"{}\";\n",
                self.graph[edge.source()],
                self.graph[edge.target()]
            ));
        }

        // Isolated steps
        for node in self.graph.node_indices() {
            if self.graph.neighbors_undirected(node).next().is_none() {
                out.push_str(&format!("    \"{}\";\n", self.graph[node]));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Numbered execution order with each step's kind and dependencies
    pub fn to_text(&self, pipeline: &Pipeline) -> String {
        let mut out = String::new();

        for (i, id) in self.topological_order().iter().enumerate() {
            let kind = pipeline
                .get_step(id)
                .map(|s| s.kind.as_str())
                .unwrap_or("step");
            let deps = self.dependencies(id).unwrap_or_default();

            out.push_str(&format!("{}. {} ({})", i + 1, id, kind));
            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }
            out.push('\n');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Step, StepKind};

    fn make_test_pipeline(steps: Vec<(&str, Vec<&str>)>) -> Pipeline {
        let mut pipeline = Pipeline::new("test", "test");
        pipeline.steps = steps
            .into_iter()
            .map(|(id, deps)| Step::new(id, id.to_uppercase(), StepKind::Extract).depends_on(deps))
            .collect();
        pipeline
    }

    #[test]
    fn test_linear_chain_levels() {
        let pipeline = make_test_pipeline(vec![
            ("s1", vec![]),
            ("s2", vec!["s1"]),
            ("s3", vec!["s2"]),
            ("s4", vec!["s3"]),
        ]);

        let dag = StepDag::from_pipeline(&pipeline);
        let levels = dag.levels();

        assert_eq!(levels["s1"], 0);
        assert_eq!(levels["s2"], 1);
        assert_eq!(levels["s3"], 2);
        assert_eq!(levels["s4"], 3);
        assert_eq!(dag.topological_order(), vec!["s1", "s2", "s3", "s4"]);
    }

    #[test]
    fn test_order_respects_dependencies_over_declared_order() {
        let pipeline = make_test_pipeline(vec![
            ("reply", vec!["summary"]),
            ("summary", vec!["extract"]),
            ("extract", vec![]),
        ]);

        let dag = StepDag::from_pipeline(&pipeline);
        assert_eq!(dag.topological_order(), vec!["extract", "summary", "reply"]);
    }

    #[test]
    fn test_diamond_levels_and_tiers() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec![]),
            ("b", vec![]),
            ("c", vec!["a", "b"]),
        ]);

        let dag = StepDag::from_pipeline(&pipeline);
        let levels = dag.levels();

        assert_eq!(levels["a"], 0);
        assert_eq!(levels["b"], 0);
        assert_eq!(levels["c"], 1);
        assert_eq!(
            dag.execution_tiers(),
            vec![vec!["a".to_string(), "b".to_string()], vec!["c".to_string()]]
        );
        assert!(!dag.has_cycle());
    }

    #[test]
    fn test_longest_chain_wins() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["a", "b"]),
        ]);

        let levels = StepDag::from_pipeline(&pipeline).levels();
        assert_eq!(levels["c"], 2);
    }

    #[test]
    fn test_two_step_cycle_is_reported_and_levels_terminate() {
        let pipeline = make_test_pipeline(vec![("a", vec!["b"]), ("b", vec!["a"])]);

        let dag = StepDag::from_pipeline(&pipeline);
        assert!(dag.has_cycle());

        let report = dag.cycle_report().unwrap();
        assert_eq!(report.cycles, vec![vec!["a".to_string(), "b".to_string()]]);
        assert!(report.to_string().contains("a → b → a"));

        let levels = dag.levels();
        assert_eq!(levels.len(), 2);
        assert!(levels["a"] < 10 && levels["b"] < 10);

        // Still total: both steps appear exactly once
        assert_eq!(dag.topological_order(), vec!["a", "b"]);
    }

    #[test]
    fn test_cycle_remainder_includes_downstream_steps() {
        let pipeline = make_test_pipeline(vec![
            ("root", vec![]),
            ("x", vec!["root", "y"]),
            ("y", vec!["x"]),
            ("after", vec!["y"]),
        ]);

        let report = StepDag::from_pipeline(&pipeline).cycle_report().unwrap();
        assert_eq!(report.remainder, vec!["x", "y", "after"]);
        assert_eq!(report.members(), vec!["x", "y"]);
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let pipeline = make_test_pipeline(vec![("loop", vec!["loop"])]);

        let dag = StepDag::from_pipeline(&pipeline);
        assert!(dag.has_cycle());
        assert!(matches!(
            dag.checked_order(),
            Err(StepgraphError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_unknown_dependency_is_ignored() {
        let pipeline = make_test_pipeline(vec![("a", vec!["ghost"])]);

        let dag = StepDag::from_pipeline(&pipeline);
        assert_eq!(dag.levels()["a"], 0);
        assert_eq!(dag.dependencies("a"), Some(vec![]));
    }

    #[test]
    fn test_depends_on_check() {
        let pipeline = make_test_pipeline(vec![
            ("a", vec![]),
            ("b", vec!["a"]),
            ("c", vec!["b"]),
        ]);

        let dag = StepDag::from_pipeline(&pipeline);

        assert!(dag.depends_on("c", "a")); // transitive
        assert!(dag.depends_on("c", "b"));
        assert!(!dag.depends_on("a", "c"));
        assert!(!dag.depends_on("a", "a"));
        assert_eq!(dag.dependents("a"), Some(vec!["b".to_string()]));
    }

    #[test]
    fn test_renderings() {
        let pipeline = make_test_pipeline(vec![("a", vec![]), ("b", vec!["a"]), ("lonely", vec![])]);

        let dag = StepDag::from_pipeline(&pipeline);
        assert!(dag.to_mermaid().contains("a --> b"));

        let dot = dag.to_dot();
        assert!(dot.contains("\"a\" -> \"b\";"));
        assert!(dot.contains("\"lonely\";"));

        let text = dag.to_text(&pipeline);
        assert!(text.contains("b (extract) [depends: a]"));
    }
}
