// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! stepgraph - Pipeline Graph Engine
//!
//! Convert, validate, order and lay out multi-step AI pipelines.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stepgraph::cli::definition::DefinitionArgs;
use stepgraph::cli::{Cli, Commands};
use stepgraph::pipeline::PipelineMeta;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stepgraph=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    stepgraph::utils::configure_colors();

    let cli = Cli::parse();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let layout_config = cli.layout_config.as_deref();

    // Dispatch to command handlers
    match cli.command {
        Commands::Validate {
            pipeline,
            graph,
            format,
        } => stepgraph::cli::validate::run(pipeline, graph, format, layout_config, cli.verbose).await,
        Commands::Graph { pipeline, format } => {
            stepgraph::cli::graph::run(pipeline, format, layout_config, cli.verbose).await
        }
        Commands::Definition {
            graph,
            id,
            name,
            description,
            format,
            no_validate,
        } => {
            let args = DefinitionArgs {
                graph,
                meta: PipelineMeta::new(id, name).with_description(description),
                format,
                no_validate,
            };
            stepgraph::cli::definition::run(args, cli.verbose).await
        }
        Commands::Layout { graph } => {
            stepgraph::cli::layout::run(graph, layout_config, cli.verbose).await
        }
        Commands::Order { pipeline } => stepgraph::cli::order::run(pipeline, cli.verbose).await,
    }
}
