//! # lavaan Model Syntax
//!
//! Directed edges become regressions (`B ~ A`), bidirected edges become
//! covariances (`A ~~ B`). No other edge kind has a lavaan form.

use crate::graph::CausalGraph;
use crate::{CausewayError, Endpoint};

const FORMAT: &str = "lavaan";

/// Render a graph as lavaan model syntax, one statement per edge.
///
/// # Errors
/// `UnsupportedEdge` for any edge that is neither directed nor bidirected.
pub fn write_lavaan(graph: &CausalGraph) -> Result<String, CausewayError> {
    let mut out = String::new();
    for edge in graph.edges() {
        let line = match (edge.endpoint1, edge.endpoint2) {
            (Endpoint::Tail, Endpoint::Arrow) => format!("{} ~ {}", edge.node2, edge.node1),
            (Endpoint::Arrow, Endpoint::Tail) => format!("{} ~ {}", edge.node1, edge.node2),
            (Endpoint::Arrow, Endpoint::Arrow) => format!("{} ~~ {}", edge.node1, edge.node2),
            _ => {
                return Err(CausewayError::UnsupportedEdge {
                    node1: edge.node1.clone(),
                    node2: edge.node2.clone(),
                    format: FORMAT,
                });
            }
        };
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}
