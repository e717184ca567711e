// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Validate command - check a pipeline definition or graph document

use colored::Colorize;
use miette::Result;
use std::path::{Path, PathBuf};

use super::OutputFormat;
use crate::graph::{definition_to_graph, LayoutConfig};
use crate::pipeline::{GraphValidator, PipelineValidator, ValidationResult};
use crate::utils::{print_error, print_section, print_warning};

/// Run the validate command
pub async fn run(
    input: PathBuf,
    is_graph: bool,
    format: OutputFormat,
    layout_config: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let (validation, summary) = if is_graph {
        let (graph, _) = super::load_graph(&input).await?.into_parts();
        let summary = format!(
            "{} nodes, {} edges",
            graph.nodes().len(),
            graph.edges().len()
        );
        (GraphValidator::validate(&graph), summary)
    } else {
        let pipeline = super::load_pipeline(&input).await?;
        let config: LayoutConfig = super::load_layout_config(layout_config).await?;

        // A stored definition must also survive conversion into an editor graph
        let mut validation = PipelineValidator::validate(&pipeline);
        let (graph, _) = definition_to_graph(&pipeline, &config);
        let graph_validation = GraphValidator::validate(&graph);
        for error in graph_validation.errors {
            if !validation.errors.contains(&error) {
                validation.add_error(&error);
            }
        }
        validation.suggestions.extend(graph_validation.suggestions);

        let summary = format!("'{}' with {} steps", pipeline.name, pipeline.steps.len());
        (validation, summary)
    };

    if format == OutputFormat::Json {
        let json = serde_json::to_string_pretty(&validation)
            .map_err(|e| miette::miette!("Failed to serialize validation result: {}", e))?;
        println!("{}", json);
        return finish(&validation);
    }

    println!("{}", "Validating pipeline...".bold());
    report(&validation, verbose);

    if verbose {
        print_section("Summary");
        println!("  {}", summary);
    }

    println!();
    if validation.is_valid() {
        if validation.has_warnings() {
            println!("{}", "Pipeline is valid but has warnings.".yellow().bold());
        } else {
            println!("{}", "Pipeline is valid!".green().bold());
        }
    }

    finish(&validation)
}

/// Print errors, warnings and (when verbose) recovery suggestions
fn report(validation: &ValidationResult, verbose: bool) {
    if !validation.errors.is_empty() {
        print_section(&"Errors".red().to_string());
        for error in &validation.errors {
            print_error(error);
        }
    }

    if validation.has_warnings() {
        print_section(&"Warnings".yellow().to_string());
        for warning in &validation.warnings {
            print_warning(warning);
        }
    }

    if verbose && !validation.suggestions.is_empty() {
        print_section("Suggestions");
        for suggestion in &validation.suggestions {
            print!("{}", suggestion);
        }
    }
}

fn finish(validation: &ValidationResult) -> Result<()> {
    if validation.is_valid() {
        Ok(())
    } else {
        Err(miette::miette!(
            "Pipeline validation failed with {} error(s)",
            validation.errors.len()
        ))
    }
}
