// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stepgraph contributors

//! Graph representation of a pipeline
//!
//! The editor works on nodes and edges; [`convert`] maps between that form
//! and the declarative [`crate::pipeline::Pipeline`], and [`layout`] places
//! nodes in dependency columns.

pub mod convert;
pub mod layout;
mod model;
mod wire;

pub use convert::{definition_to_graph, graph_to_definition, prepare_for_save};
pub use layout::{auto_layout, Layout, LayoutConfig, Position};
pub use model::*;
pub use wire::{GraphDocument, NodeData, NodeType, WireNode};
