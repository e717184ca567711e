// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Order command - show execution order and concurrency tiers

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use crate::pipeline::{PipelineValidator, StepDag};
use crate::utils::{print_error, print_info, print_numbered, print_section};

/// Run the order command
pub async fn run(pipeline_path: PathBuf, verbose: bool) -> Result<()> {
    let pipeline = super::load_pipeline(&pipeline_path).await?;

    let validation = PipelineValidator::validate(&pipeline);
    if !validation.is_valid() {
        eprintln!("{}", "Pipeline validation failed:".red().bold());
        for error in &validation.errors {
            print_error(error);
        }
        return Err(miette::miette!("Cannot order an invalid pipeline"));
    }

    let dag = StepDag::from_pipeline(&pipeline);
    let order = dag.checked_order()?;

    print_section("Execution order");
    for (i, id) in order.iter().enumerate() {
        let deps = dag.dependencies(id).unwrap_or_default();
        if verbose && !deps.is_empty() {
            print_numbered(i + 1, &format!("{} {}", id, format!("[after: {}]", deps.join(", ")).dimmed()));
        } else {
            print_numbered(i + 1, id);
        }
    }

    print_section("Tiers");
    for (level, tier) in dag.execution_tiers().iter().enumerate() {
        print_info(&format!("level {}: {}", level, tier.join(", ")));
    }

    Ok(())
}
