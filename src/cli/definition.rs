// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Definition command - turn an edited graph back into a pipeline definition

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::DefinitionFormat;
use crate::errors::StepgraphError;
use crate::graph::{graph_to_definition, prepare_for_save};
use crate::pipeline::{GraphValidator, PipelineMeta};

/// Arguments for the definition command
#[derive(Debug, Clone)]
pub struct DefinitionArgs {
    pub graph: PathBuf,
    pub meta: PipelineMeta,
    pub format: DefinitionFormat,
    pub no_validate: bool,
}

/// Run the definition command
pub async fn run(args: DefinitionArgs, verbose: bool) -> Result<()> {
    let (graph, _) = super::load_graph(&args.graph).await?.into_parts();

    let pipeline = if args.no_validate {
        graph_to_definition(&graph, args.meta)
    } else {
        match prepare_for_save(&graph, args.meta) {
            Ok(pipeline) => pipeline,
            Err(StepgraphError::ValidationFailed { errors }) => {
                // stdout carries the definition, so the refusal goes to stderr
                eprintln!("{}", "Graph cannot be saved:".red().bold());
                for error in &errors {
                    eprintln!("  {} {}", "✗".red(), error);
                }
                if verbose {
                    for suggestion in GraphValidator::validate(&graph).suggestions {
                        eprint!("{}", suggestion);
                    }
                }
                return Err(StepgraphError::ValidationFailed { errors }.into());
            }
            Err(e) => return Err(e.into()),
        }
    };

    let output = match args.format {
        DefinitionFormat::Yaml => pipeline.to_yaml()?,
        DefinitionFormat::Json => pipeline.to_json()?,
    };

    print!("{}", output);
    if !output.ends_with('\n') {
        println!();
    }

    Ok(())
}
