// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Pipeline definition structures
//!
//! Defines the declarative interchange schema exchanged with the persistence
//! layer. Files may be YAML or JSON.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::errors::{StepgraphError, StepgraphResult};

/// Declarative pipeline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    /// Pipeline identifier
    pub id: String,

    /// Pipeline name
    pub name: String,

    /// Pipeline description
    #[serde(default)]
    pub description: String,

    /// Steps in declared (advisory) order
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Output channel selections
    #[serde(default)]
    pub output: OutputChannels,
}

impl Pipeline {
    /// Create an empty pipeline
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            steps: Vec::new(),
            output: OutputChannels::default(),
        }
    }

    /// Load a pipeline from a YAML or JSON file (chosen by extension)
    pub fn from_file(path: &Path) -> StepgraphResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| StepgraphError::FileReadError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        Self::parse(&content, path)
    }

    /// Parse file content, using the path's extension to pick the format
    pub fn parse(content: &str, path: &Path) -> StepgraphResult<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(content),
            _ => Self::from_yaml(content),
        }
    }

    /// Parse pipeline from YAML string
    pub fn from_yaml(yaml: &str) -> StepgraphResult<Self> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse pipeline from JSON string
    pub fn from_json(json: &str) -> StepgraphResult<Self> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Serialize pipeline to YAML
    pub fn to_yaml(&self) -> StepgraphResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Serialize pipeline to pretty JSON
    pub fn to_json(&self) -> StepgraphResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Get a step by id
    pub fn get_step(&self, id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// All step ids in declared order
    pub fn step_ids(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.id.as_str()).collect()
    }

    /// Caller-owned identity of this pipeline
    pub fn meta(&self) -> PipelineMeta {
        PipelineMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Steps that no other step lists as a dependency
    pub fn sink_steps(&self) -> Vec<&Step> {
        let depended_on: HashSet<&str> = self
            .steps
            .iter()
            .flat_map(|step| {
                step.dependencies
                    .iter()
                    .filter(move |dep| **dep != step.id)
                    .map(String::as_str)
            })
            .collect();

        self.steps
            .iter()
            .filter(|s| !depended_on.contains(s.id.as_str()))
            .collect()
    }
}

/// Identity fields passed through the graph round trip untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineMeta {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl PipelineMeta {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// A single pipeline step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Step id (must be unique within pipeline)
    pub id: String,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// What the step produces
    #[serde(rename = "type")]
    pub kind: StepKind,

    /// Model class used to run the step
    #[serde(rename = "model", default)]
    pub model_class: ModelClass,

    /// Prompt used instead of the kind's default
    #[serde(
        rename = "prompt_template",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub prompt_override: Option<String>,

    /// Steps whose output this step consumes as context
    #[serde(rename = "context_from", default)]
    pub dependencies: Vec<String>,
}

impl Step {
    /// Create a step with the default model and no dependencies
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            model_class: ModelClass::default(),
            prompt_override: None,
            dependencies: Vec::new(),
        }
    }

    pub fn with_model(mut self, model_class: ModelClass) -> Self {
        self.model_class = model_class;
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_override = Some(prompt.into());
        self
    }

    /// Add dependencies, skipping ids already present
    pub fn depends_on<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for dep in deps {
            let dep = dep.into();
            if !self.dependencies.contains(&dep) {
                self.dependencies.push(dep);
            }
        }
        self
    }
}

/// Kind of result a step produces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    /// Structured field extraction
    Extract,
    /// Free-text reply
    Reply,
    /// Both
    ExtractAndReply,
}

impl StepKind {
    /// Whether the step contributes to the table channel
    pub fn feeds_table(self) -> bool {
        matches!(self, Self::Extract | Self::ExtractAndReply)
    }

    /// Whether the step contributes to the reply channel
    pub fn feeds_reply(self) -> bool {
        matches!(self, Self::Reply | Self::ExtractAndReply)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extract => "extract",
            Self::Reply => "reply",
            Self::ExtractAndReply => "extract_and_reply",
        }
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model classes
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ModelClass {
    Fast,
    #[default]
    Default,
    Vision,
}

impl std::fmt::Display for ModelClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Default => write!(f, "default"),
            Self::Vision => write!(f, "vision"),
        }
    }
}

/// Which steps feed the table and reply output channels
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputChannels {
    #[serde(rename = "table_from", default)]
    pub table_sources: Vec<String>,

    #[serde(rename = "reply_from", default)]
    pub reply_sources: Vec<String>,
}

impl OutputChannels {
    /// Union of both channels' sources
    pub fn output_steps(&self) -> HashSet<&str> {
        self.table_sources
            .iter()
            .chain(&self.reply_sources)
            .map(String::as_str)
            .collect()
    }

    /// True when no explicit selection exists
    pub fn is_empty(&self) -> bool {
        self.table_sources.is_empty() && self.reply_sources.is_empty()
    }

    /// Derive channel membership from step kinds alone
    pub fn from_step_kinds(steps: &[Step]) -> Self {
        let mut channels = Self::default();
        for step in steps {
            if step.kind.feeds_table() {
                channels.table_sources.push(step.id.clone());
            }
            if step.kind.feeds_reply() {
                channels.reply_sources.push(step.id.clone());
            }
        }
        channels
    }
}
