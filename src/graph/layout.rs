// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Column layout for pipeline graphs
//!
//! Positions are presentation state and live in a [`Layout`] sidecar keyed by
//! node id, separate from the headless [`Graph`]. Steps are placed in one
//! column per dependency level; each column is centred vertically on the
//! origin row. Start sits at the origin and End one column past the last
//! level. Layout is always recomputed from scratch.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::errors::{StepgraphError, StepgraphResult};
use crate::graph::{Graph, NodeRole};
use crate::pipeline::StepDag;

/// Screen coordinates of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position sidecar keyed by node id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layout {
    positions: BTreeMap<String, Position>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// Position of a node, or the origin when it was never placed
    pub fn position_or_default(&self, id: &str) -> Position {
        self.get(id).unwrap_or_default()
    }

    pub fn set(&mut self, id: impl Into<String>, position: Position) {
        self.positions.insert(id.into(), position);
    }

    /// Drop positions for nodes no longer in the graph
    pub fn retain_nodes(&mut self, graph: &Graph) {
        self.positions.retain(|id, _| graph.contains_node(id));
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Layout geometry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Start node x
    #[serde(default)]
    pub origin_x: f64,

    /// Start node y; columns are centred on this row
    #[serde(default)]
    pub origin_y: f64,

    #[serde(default = "default_node_width")]
    pub node_width: f64,

    #[serde(default = "default_node_height")]
    pub node_height: f64,

    #[serde(default = "default_horizontal_gap")]
    pub horizontal_gap: f64,

    #[serde(default = "default_vertical_gap")]
    pub vertical_gap: f64,
}

fn default_node_width() -> f64 {
    250.0
}

fn default_node_height() -> f64 {
    100.0
}

fn default_horizontal_gap() -> f64 {
    100.0
}

fn default_vertical_gap() -> f64 {
    50.0
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            node_width: default_node_width(),
            node_height: default_node_height(),
            horizontal_gap: default_horizontal_gap(),
            vertical_gap: default_vertical_gap(),
        }
    }
}

impl LayoutConfig {
    /// Load layout settings from a TOML file
    pub fn from_file(path: &Path) -> StepgraphResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StepgraphError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> StepgraphResult<Self> {
        toml::from_str(content).map_err(Into::into)
    }

    /// X of the given column; column 0 holds Start
    pub fn column_x(&self, column: usize) -> f64 {
        self.origin_x + column as f64 * (self.node_width + self.horizontal_gap)
    }

    /// Y of member `row` in a column of `count` nodes centred on the origin row
    pub fn row_y(&self, row: usize, count: usize) -> f64 {
        let offset = row as f64 - (count.saturating_sub(1)) as f64 / 2.0;
        self.origin_y + offset * (self.node_height + self.vertical_gap)
    }

    pub fn origin(&self) -> Position {
        Position::new(self.origin_x, self.origin_y)
    }
}

/// Place Start, the step tiers and End.
///
/// `tiers[L]` holds the step ids at level L in the order they should be
/// stacked. Every Start id goes to the origin and every End id to the column
/// after the last tier.
pub(crate) fn place<'a>(
    starts: impl IntoIterator<Item = &'a str>,
    ends: impl IntoIterator<Item = &'a str>,
    tiers: &[Vec<String>],
    config: &LayoutConfig,
) -> Layout {
    let mut layout = Layout::new();

    for id in starts {
        layout.set(id, config.origin());
    }

    for (level, tier) in tiers.iter().enumerate() {
        let x = config.column_x(level + 1);
        for (row, id) in tier.iter().enumerate() {
            layout.set(id.clone(), Position::new(x, config.row_y(row, tier.len())));
        }
    }

    // maxLevel + 2, or column 1 when there are no steps
    let end_position = Position::new(config.column_x(tiers.len() + 1), config.origin_y);
    for id in ends {
        layout.set(id, end_position);
    }

    layout
}

/// Group ids into tiers by level, keeping the given order within a tier
pub(crate) fn group_by_level<'a>(
    ids: impl IntoIterator<Item = &'a str>,
    levels: &HashMap<String, usize>,
) -> Vec<Vec<String>> {
    let mut tiers: Vec<Vec<String>> = Vec::new();
    for id in ids {
        let level = levels.get(id).copied().unwrap_or(0);
        if tiers.len() <= level {
            tiers.resize_with(level + 1, Vec::new);
        }
        if !tiers[level].iter().any(|existing| existing == id) {
            tiers[level].push(id.to_string());
        }
    }
    tiers
}

/// Recompute every node position from the graph's current edges.
///
/// Topology is untouched and prior positions are ignored.
pub fn auto_layout(graph: &Graph, config: &LayoutConfig) -> Layout {
    let levels = StepDag::from_graph(graph).levels();
    let tiers = group_by_level(graph.step_nodes().map(|n| n.id.as_str()), &levels);

    tracing::debug!(
        nodes = graph.nodes().len(),
        columns = tiers.len(),
        "computed auto layout"
    );

    place(
        graph
            .nodes()
            .iter()
            .filter(|n| n.role() == NodeRole::Start)
            .map(|n| n.id.as_str()),
        graph
            .nodes()
            .iter()
            .filter(|n| n.role() == NodeRole::End)
            .map(|n| n.id.as_str()),
        &tiers,
        config,
    )
}
