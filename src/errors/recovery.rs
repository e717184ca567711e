// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from validation failures.

use serde::Serialize;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Suggest fixing a circular dependency
    pub fn fix_circular_dependency(steps: &[String]) -> Self {
        Self {
            action: "Remove circular dependency".into(),
            steps: vec![
                format!("Detected cycle: {}", steps.join(" → ")),
                "Delete one of the edges between these steps".into(),
                "Steps must form a directed acyclic graph (DAG)".into(),
            ],
            commands: vec![
                "# Visualize the pipeline:".into(),
                "stepgraph graph --format mermaid".into(),
            ],
        }
    }

    /// Suggest adding the missing terminal node
    pub fn add_terminal(role: &str) -> Self {
        Self {
            action: format!("Restore the {} node", role),
            steps: vec![
                format!("A pipeline graph needs exactly one {} node", role),
                "Re-open the pipeline from its stored definition to regenerate it".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest adding a first step
    pub fn add_steps() -> Self {
        Self {
            action: "Add at least one step".into(),
            steps: vec!["Add an extract or reply step between Start and End".into()],
            commands: vec![],
        }
    }

    /// Suggest wiring a terminal to the step graph
    pub fn connect_terminal(role: &str) -> Self {
        let steps = if role == "start" {
            vec![
                "No step receives input from Start".into(),
                "Connect Start to every step that needs no other step's output".into(),
            ]
        } else {
            vec![
                "No step feeds End".into(),
                "Connect the steps whose results should be returned to End".into(),
            ]
        };

        Self {
            action: format!("Connect the {} node", role),
            steps,
            commands: vec![],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}
