// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Error types
//!
//! Structural and cycle problems in a pipeline are reported through the
//! validators' error lists, never through these types. `StepgraphError`
//! covers the operations that can genuinely fail: file I/O, parsing, graph
//! edits and the save gate.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for stepgraph operations
pub type StepgraphResult<T> = Result<T, StepgraphError>;

/// Main error type for stepgraph
#[derive(Error, Debug, Diagnostic)]
pub enum StepgraphError {
    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline failed validation with {} error(s)", .errors.len())]
    #[diagnostic(
        code(stepgraph::validation_failed),
        help("Fix every listed error before saving; nothing was persisted")
    )]
    ValidationFailed { errors: Vec<String> },

    #[error("Circular dependency between steps: {}", .steps.join(" → "))]
    #[diagnostic(
        code(stepgraph::circular_dependency),
        help("Review your step dependencies to remove the cycle")
    )]
    CircularDependency { steps: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Graph Edit Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Node '{id}' not found in graph")]
    #[diagnostic(code(stepgraph::unknown_node))]
    UnknownNode { id: String },

    #[error("Node '{id}' already exists in graph")]
    #[diagnostic(
        code(stepgraph::duplicate_node),
        help("Node ids must be unique; pick a different step id")
    )]
    DuplicateNode { id: String },

    #[error("Edge '{source_id}' → '{target_id}' already exists")]
    #[diagnostic(code(stepgraph::duplicate_edge))]
    DuplicateEdge { source_id: String, target_id: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("File not found: {path}")]
    #[diagnostic(code(stepgraph::file_not_found))]
    FileNotFound {
        path: PathBuf,
        #[help]
        help: Option<String>,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(stepgraph::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Parse Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(stepgraph::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(stepgraph::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(stepgraph::toml_error))]
    Toml { message: String },
}

impl From<serde_yaml::Error> for StepgraphError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for StepgraphError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for StepgraphError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl StepgraphError {
    /// Create a file not found error with a hint about the expected content
    pub fn file_not_found(path: PathBuf, what: &str) -> Self {
        Self::FileNotFound {
            path,
            help: Some(format!("Expected a {} file at this path", what)),
        }
    }

    /// Validation errors carried by this error, if any
    pub fn validation_errors(&self) -> &[String] {
        match self {
            Self::ValidationFailed { errors } => errors,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_failed_message_counts_errors() {
        let err = StepgraphError::ValidationFailed {
            errors: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "Pipeline failed validation with 2 error(s)");
        assert_eq!(err.validation_errors().len(), 2);
    }

    #[test]
    fn test_circular_dependency_message() {
        let err = StepgraphError::CircularDependency {
            steps: vec!["a".into(), "b".into()],
        };
        assert!(err.to_string().contains("a → b"));
        assert!(err.validation_errors().is_empty());
    }
}
