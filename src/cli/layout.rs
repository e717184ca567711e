// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Layout command - recompute positions for an edited graph

use miette::Result;
use std::path::{Path, PathBuf};

use crate::graph::{auto_layout, GraphDocument};

/// Run the layout command
pub async fn run(graph_path: PathBuf, layout_config: Option<&Path>, _verbose: bool) -> Result<()> {
    let config = super::load_layout_config(layout_config).await?;
    let (graph, _previous) = super::load_graph(&graph_path).await?.into_parts();

    let layout = auto_layout(&graph, &config);
    tracing::info!(positions = layout.len(), "recomputed layout");

    println!("{}", GraphDocument::from_graph(&graph, &layout).to_json()?);

    Ok(())
}
