//! # Marshallers
//!
//! Session-bound converters between host-side and engine-side
//! representations.
//!
//! - `data`: host frame ⇄ typed dataset
//! - `graph`: causal graph ⇄ endpoint matrix, alternate graph, adjacency
//!
//! The free functions in each submodule do the conversion; the
//! `DataMarshaller` / `GraphMarshaller` wrappers bind them to an open
//! `EngineSession` and its configured defaults.

pub mod data;
pub mod graph;

pub use data::{CategoryExport, DataMarshaller, TypingPolicy, export_frame, import_frame};
pub use graph::{
    GraphMarshaller, adjacency_to_graph, general_to_graph, graph_to_general, graph_to_matrix,
    graph_to_matrix_ordered, matrix_to_graph,
};
