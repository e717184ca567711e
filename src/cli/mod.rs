// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for stepgraph.

pub mod definition;
pub mod graph;
pub mod layout;
pub mod order;
pub mod validate;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;
use std::path::{Path, PathBuf};

use crate::errors::StepgraphError;
use crate::graph::{GraphDocument, LayoutConfig};
use crate::pipeline::Pipeline;

/// Pipeline graph engine
///
/// Convert, validate, order and lay out multi-step AI pipelines.
#[derive(Parser, Debug)]
#[clap(
    name = "stepgraph",
    version,
    about = "Pipeline graph engine for multi-step AI pipelines",
    long_about = None,
    after_help = "Examples:\n\
        stepgraph validate pipeline.yaml            Validate a pipeline definition\n\
        stepgraph graph pipeline.yaml -f json       Build the editor graph\n\
        stepgraph definition graph.json --id p1 --name Triage\n\
        stepgraph layout graph.json                 Re-layout an edited graph\n\n\
        See 'stepgraph <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Layout settings (TOML)
    #[clap(long, global = true, value_name = "FILE", env = "STEPGRAPH_LAYOUT")]
    pub layout_config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a pipeline definition or graph document
    Validate {
        /// Pipeline file (YAML or JSON), or graph document with --graph
        #[clap(default_value = "pipeline.yaml")]
        pipeline: PathBuf,

        /// Treat the input as a graph document
        #[clap(long)]
        graph: bool,

        /// Output format
        #[clap(short, long, default_value = "text", value_enum)]
        format: OutputFormat,
    },

    /// Convert a pipeline definition into a graph
    Graph {
        /// Pipeline file
        #[clap(default_value = "pipeline.yaml")]
        pipeline: PathBuf,

        /// Output format
        #[clap(short, long, default_value = "json", value_enum)]
        format: GraphFormat,
    },

    /// Convert an edited graph back into a pipeline definition
    Definition {
        /// Graph document (JSON)
        graph: PathBuf,

        /// Pipeline id
        #[clap(long)]
        id: String,

        /// Pipeline name
        #[clap(long)]
        name: String,

        /// Pipeline description
        #[clap(long, default_value = "")]
        description: String,

        /// Output format
        #[clap(short, long, default_value = "yaml", value_enum)]
        format: DefinitionFormat,

        /// Skip the save gate and print whatever the graph converts to
        #[clap(long)]
        no_validate: bool,
    },

    /// Recompute node positions for a graph document
    Layout {
        /// Graph document (JSON)
        graph: PathBuf,
    },

    /// Show execution order and tiers
    Order {
        /// Pipeline file
        #[clap(default_value = "pipeline.yaml")]
        pipeline: PathBuf,
    },
}

/// Output format for the validate command
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GraphFormat {
    Json,
    Text,
    Dot,
    Mermaid,
}

/// Definition output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DefinitionFormat {
    Yaml,
    Json,
}

async fn read_input(path: &Path, what: &str) -> Result<String> {
    if !path.exists() {
        return Err(StepgraphError::file_not_found(path.to_path_buf(), what).into());
    }

    tokio::fs::read_to_string(path).await.map_err(|e| {
        StepgraphError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        }
        .into()
    })
}

/// Load a pipeline definition
pub async fn load_pipeline(path: &Path) -> Result<Pipeline> {
    let content = read_input(path, "pipeline definition").await?;
    let pipeline = Pipeline::parse(&content, path)?;
    tracing::info!(pipeline = %pipeline.id, steps = pipeline.steps.len(), "loaded pipeline");
    Ok(pipeline)
}

/// Load a graph document
pub async fn load_graph(path: &Path) -> Result<GraphDocument> {
    let content = read_input(path, "graph document").await?;
    let document = GraphDocument::from_json(&content)?;
    tracing::info!(
        nodes = document.nodes.len(),
        edges = document.edges.len(),
        "loaded graph document"
    );
    Ok(document)
}

/// Load layout settings, falling back to defaults
pub async fn load_layout_config(path: Option<&Path>) -> Result<LayoutConfig> {
    match path {
        None => Ok(LayoutConfig::default()),
        Some(path) => {
            let content = read_input(path, "layout configuration").await?;
            Ok(LayoutConfig::from_toml(&content)?)
        }
    }
}
