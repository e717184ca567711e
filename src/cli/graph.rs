// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Graph command - convert a pipeline definition into an editor graph

use miette::Result;
use std::path::{Path, PathBuf};

use super::GraphFormat;
use crate::graph::{definition_to_graph, GraphDocument};
use crate::pipeline::StepDag;

/// Run the graph command
pub async fn run(
    pipeline_path: PathBuf,
    format: GraphFormat,
    layout_config: Option<&Path>,
    _verbose: bool,
) -> Result<()> {
    let pipeline = super::load_pipeline(&pipeline_path).await?;

    let output = match format {
        GraphFormat::Json => {
            let config = super::load_layout_config(layout_config).await?;
            let (graph, layout) = definition_to_graph(&pipeline, &config);
            GraphDocument::from_graph(&graph, &layout).to_json()?
        }
        GraphFormat::Text => StepDag::from_pipeline(&pipeline).to_text(&pipeline),
        GraphFormat::Dot => StepDag::from_pipeline(&pipeline).to_dot(),
        GraphFormat::Mermaid => StepDag::from_pipeline(&pipeline).to_mermaid(),
    };

    println!("{}", output);

    Ok(())
}
