// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Conversion between declarative pipelines and graphs
//!
//! Both directions are total: malformed input produces a graph or pipeline
//! that the validators then reject, never a panic or an error.

use std::collections::{HashMap, HashSet};

use crate::errors::{StepgraphError, StepgraphResult};
use crate::graph::layout::{group_by_level, place};
use crate::graph::{Graph, GraphEdge, GraphNode, Layout, LayoutConfig, END_NODE_ID, START_NODE_ID};
use crate::pipeline::{
    GraphValidator, OutputChannels, Pipeline, PipelineMeta, PipelineValidator, StepDag,
};

/// Build a positioned graph from a declarative pipeline.
///
/// Steps with no dependencies hang off Start. Sink steps connect to End;
/// once any output channel selection exists, only selected sinks do.
pub fn definition_to_graph(pipeline: &Pipeline, config: &LayoutConfig) -> (Graph, Layout) {
    let known: HashSet<&str> = pipeline.steps.iter().map(|s| s.id.as_str()).collect();
    let start_id = terminal_id(START_NODE_ID, &known);
    let end_id = terminal_id(END_NODE_ID, &known);

    let levels = StepDag::from_pipeline(pipeline).levels();
    let tiers = group_by_level(pipeline.steps.iter().map(|s| s.id.as_str()), &levels);
    let layout = place([start_id.as_str()], [end_id.as_str()], &tiers, config);

    let mut nodes = Vec::with_capacity(pipeline.steps.len() + 2);
    nodes.push(GraphNode::start(start_id.as_str()));
    nodes.extend(pipeline.steps.iter().map(GraphNode::step));
    nodes.push(GraphNode::end(end_id.as_str()));

    let mut edges = Vec::new();

    for step in pipeline.steps.iter().filter(|s| s.dependencies.is_empty()) {
        edges.push(GraphEdge::between(start_id.as_str(), &step.id));
    }

    for step in &pipeline.steps {
        for dep in &step.dependencies {
            if known.contains(dep.as_str()) {
                edges.push(GraphEdge::between(dep, &step.id));
            } else {
                tracing::debug!(step = %step.id, dependency = %dep, "dropping edge to unknown step");
            }
        }
    }

    let output_steps = pipeline.output.output_steps();
    for sink in pipeline.sink_steps() {
        if output_steps.is_empty() || output_steps.contains(sink.id.as_str()) {
            edges.push(GraphEdge::between(&sink.id, end_id.as_str()));
        }
    }

    tracing::debug!(
        pipeline = %pipeline.id,
        steps = pipeline.steps.len(),
        edges = edges.len(),
        "converted definition to graph"
    );

    (Graph::from_parts(nodes, edges), layout)
}

/// Terminal node id that no step uses: `base`, else `base-1`, `base-2`, ...
fn terminal_id(base: &str, taken: &HashSet<&str>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let id = format!("{}-{}", base, n);
        if !taken.contains(id.as_str()) {
            return id;
        }
        n += 1;
    }
}

/// Rebuild a declarative pipeline from an edited graph.
///
/// Steps come out in dependency order. Output channels are re-derived from
/// step kinds, not from the edges into End.
pub fn graph_to_definition(graph: &Graph, meta: PipelineMeta) -> Pipeline {
    let mut seen = HashSet::new();
    let step_nodes: Vec<&GraphNode> = graph
        .step_nodes()
        .filter(|n| seen.insert(n.id.as_str()))
        .collect();

    // target → sources, excluding Start and anything that is not a step
    let mut incoming: HashMap<&str, Vec<String>> = HashMap::new();
    for edge in graph.edges() {
        if !graph.is_step(&edge.source) || !graph.is_step(&edge.target) {
            continue;
        }
        let sources = incoming.entry(edge.target.as_str()).or_default();
        if !sources.contains(&edge.source) {
            sources.push(edge.source.clone());
        }
    }

    let mut dag = StepDag::new();
    for node in &step_nodes {
        dag.add_step(&node.id);
    }
    for (target, sources) in &incoming {
        for source in sources {
            dag.add_dependency(source, target);
        }
    }

    let by_id: HashMap<&str, &GraphNode> =
        step_nodes.iter().map(|n| (n.id.as_str(), *n)).collect();

    let steps: Vec<_> = dag
        .topological_order()
        .iter()
        .filter_map(|id| {
            let payload = by_id.get(id.as_str())?.payload()?;
            let dependencies = incoming.get(id.as_str()).cloned().unwrap_or_default();
            Some(payload.to_step(id, dependencies))
        })
        .collect();

    let output = OutputChannels::from_step_kinds(&steps);

    tracing::debug!(pipeline = %meta.id, steps = steps.len(), "converted graph to definition");

    Pipeline {
        id: meta.id,
        name: meta.name,
        description: meta.description,
        steps,
        output,
    }
}

/// Save gate: convert an edited graph and refuse it unless every check passes.
///
/// Returns every accumulated error, graph checks first.
pub fn prepare_for_save(graph: &Graph, meta: PipelineMeta) -> StepgraphResult<Pipeline> {
    let pipeline = graph_to_definition(graph, meta);

    let mut errors = GraphValidator::validate(graph).errors;
    for error in PipelineValidator::validate(&pipeline).errors {
        if !errors.contains(&error) {
            errors.push(error);
        }
    }

    if errors.is_empty() {
        Ok(pipeline)
    } else {
        tracing::debug!(pipeline = %pipeline.id, errors = errors.len(), "refusing to save");
        Err(StepgraphError::ValidationFailed { errors })
    }
}
