//! # Graphviz DOT
//!
//! Every edge is drawn with `dir=both` and one arrow style per side:
//! TAIL → `none`, ARROW → `empty`, CIRCLE → `odot`. Bidirected edges are
//! red, all others blue. NULL and STAR have no DOT image.

use crate::graph::{CausalGraph, Edge};
use crate::{CausewayError, Endpoint};

const VOCABULARY: &str = "dot";

/// DOT arrow style for an endpoint.
pub fn arrow_style(endpoint: Endpoint) -> Result<&'static str, CausewayError> {
    match endpoint {
        Endpoint::Tail => Ok("none"),
        Endpoint::Arrow => Ok("empty"),
        Endpoint::Circle => Ok("odot"),
        Endpoint::Null | Endpoint::Star => Err(CausewayError::UnmappedEndpoint {
            endpoint,
            vocabulary: VOCABULARY,
        }),
    }
}

/// Render a graph as a DOT digraph.
///
/// # Errors
/// `UnmappedEndpoint` if any edge carries NULL or STAR.
pub fn write_dot(graph: &CausalGraph) -> Result<String, CausewayError> {
    let mut out = String::from("digraph g {\n");
    for node in graph.nodes() {
        out.push_str(&format!(
            "  {} [shape=circle, fixedsize=true, style=filled, color=lightgray];\n",
            quote(node)
        ));
    }
    for edge in graph.edges() {
        out.push_str(&edge_line(edge)?);
    }
    out.push_str("}\n");
    Ok(out)
}

fn edge_line(edge: &Edge) -> Result<String, CausewayError> {
    let tail = arrow_style(edge.endpoint1)?;
    let head = arrow_style(edge.endpoint2)?;
    let color = if edge.endpoint1 == Endpoint::Arrow && edge.endpoint2 == Endpoint::Arrow {
        "red"
    } else {
        "blue"
    };
    Ok(format!(
        "  {} -> {} [arrowtail={tail}, arrowhead={head}, dir=both, color={color}];\n",
        quote(&edge.node1),
        quote(&edge.node2)
    ))
}

fn quote(id: &str) -> String {
    let mut quoted = String::with_capacity(id.len() + 2);
    quoted.push('"');
    for c in id.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styles_and_colours() {
        let mut g = CausalGraph::with_nodes(["A", "B", "C"]).expect("nodes");
        g.add_edge(Edge::directed("A", "B")).expect("edge");
        g.add_edge(Edge::bidirected("B", "C")).expect("edge");
        let dot = write_dot(&g).expect("dot");

        assert!(dot.starts_with("digraph g {\n"));
        assert!(dot.contains("\"A\" -> \"B\" [arrowtail=none, arrowhead=empty, dir=both, color=blue]"));
        assert!(dot.contains("\"B\" -> \"C\" [arrowtail=empty, arrowhead=empty, dir=both, color=red]"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn circle_is_odot() {
        let mut g = CausalGraph::with_nodes(["A", "B"]).expect("nodes");
        g.add_edge(Edge::partially_oriented("A", "B")).expect("edge");
        assert!(write_dot(&g).expect("dot").contains("arrowtail=odot, arrowhead=empty"));
    }

    #[test]
    fn null_and_star_are_unmapped() {
        for endpoint in [Endpoint::Null, Endpoint::Star] {
            let mut g = CausalGraph::with_nodes(["A", "B"]).expect("nodes");
            g.add_edge(Edge::new("A", "B", Endpoint::Tail, endpoint))
                .expect("edge");
            assert!(matches!(
                write_dot(&g),
                Err(CausewayError::UnmappedEndpoint { vocabulary: "dot", .. })
            ));
        }
    }

    #[test]
    fn names_are_escaped() {
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }
}
