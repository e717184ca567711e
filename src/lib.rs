// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! # stepgraph - Pipeline Graph Engine
//!
//! `stepgraph` keeps multi-step AI pipelines in two interchangeable forms:
//! a declarative list of steps and an editable node-and-edge graph.
//!
//! ## Features
//!
//! - **Conversion** - Definition → graph and graph → definition
//! - **Validation** - Accumulated structural and cycle errors, never auto-repaired
//! - **Ordering** - Dependency levels, topological order and execution tiers
//! - **Layout** - Deterministic column layout, recomputed on demand
//!
//! ## Quick Start
//!
//! ```bash
//! # Validate a pipeline
//! stepgraph validate pipeline.yaml
//!
//! # Produce the editor graph
//! stepgraph graph pipeline.yaml --format json
//!
//! # Turn an edited graph back into a definition
//! stepgraph definition graph.json --id p1 --name "Support triage"
//! ```

pub mod cli;
pub mod errors;
pub mod graph;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use errors::{StepgraphError, StepgraphResult};
pub use graph::{Graph, GraphDocument, Layout, LayoutConfig};
pub use pipeline::{Pipeline, Step, StepDag};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
