// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Pipeline definitions, dependency analysis and validation
//!
//! This module defines the declarative pipeline record, the step dependency
//! DAG (ordering, levels, cycle detection) and the validators.

mod dag;
mod definition;
mod validation;

pub use dag::{CycleReport, StepDag};
pub use definition::*;
pub use validation::{GraphValidator, PipelineValidator, ValidationResult};
