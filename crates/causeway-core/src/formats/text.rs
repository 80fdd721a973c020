//! # Graph Text
//!
//! ```text
//! Graph Nodes:
//! A;B;C
//!
//! Graph Edges:
//! 1. A --> B
//! 2. B o-o C
//! ```
//!
//! Edge glyphs are `-` (TAIL), `<`/`>` (ARROW), `o` (CIRCLE), `.` (NULL)
//! and `*` (STAR). Tokens after the second node name on an edge line
//! are edge annotations and are skipped when parsing.

use crate::graph::{CausalGraph, Edge, left_glyph, right_glyph};
use crate::{CausewayError, Endpoint};
use std::fmt::Write;

const NODES_HEADER: &str = "Graph Nodes:";
const EDGES_HEADER: &str = "Graph Edges:";
const NODE_SEPARATOR: char = ';';

/// Render a graph as text.
#[must_use]
pub fn write_graph(graph: &CausalGraph) -> String {
    let mut out = String::new();
    out.push_str(NODES_HEADER);
    out.push('\n');
    out.push_str(&graph.nodes().join(";"));
    out.push_str("\n\n");
    out.push_str(EDGES_HEADER);
    out.push('\n');
    for (i, edge) in graph.edges().enumerate() {
        let _ = writeln!(out, "{}. {edge}", i + 1);
    }
    out
}

/// Parse graph text.
///
/// # Errors
/// `GraphParse` for a missing header or malformed edge line, plus the
/// usual graph errors (`DuplicateNode`, `NodeNotFound`, `MultiEdge`, ...)
/// with no line attached.
pub fn parse_graph(source: &str) -> Result<CausalGraph, CausewayError> {
    let mut lines = source
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty());

    match lines.next() {
        Some((_, NODES_HEADER)) => {}
        Some((line, _)) => return Err(parse_error(line, "expected 'Graph Nodes:'")),
        None => return Err(parse_error(1, "empty graph text")),
    }

    let mut graph = CausalGraph::new();
    let mut next = lines.next();
    if let Some((_, l)) = next.filter(|(_, l)| *l != EDGES_HEADER) {
        for name in l.split(NODE_SEPARATOR).map(str::trim).filter(|n| !n.is_empty()) {
            graph.add_node(name)?;
        }
        next = lines.next();
    }

    match next {
        Some((_, EDGES_HEADER)) | None => {}
        Some((line, _)) => return Err(parse_error(line, "expected 'Graph Edges:'")),
    }

    for (line, l) in lines {
        graph.add_edge(parse_edge_line(line, l)?)?;
    }
    Ok(graph)
}

fn parse_edge_line(line: usize, text: &str) -> Result<Edge, CausewayError> {
    let mut tokens = text.split_whitespace();
    let (Some(number), Some(node1), Some(glyphs), Some(node2)) =
        (tokens.next(), tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(parse_error(line, "expected '<n>. <node> <edge> <node>'"));
    };
    if !number.ends_with('.') {
        return Err(parse_error(line, format!("bad edge number '{number}'")));
    }
    let (endpoint1, endpoint2) =
        parse_glyphs(glyphs).ok_or_else(|| parse_error(line, format!("bad edge '{glyphs}'")))?;
    Ok(Edge::new(node1, node2, endpoint1, endpoint2))
}

fn parse_glyphs(glyphs: &str) -> Option<(Endpoint, Endpoint)> {
    let mut chars = glyphs.chars();
    let (left, middle, right) = (chars.next()?, chars.next()?, chars.next()?);
    if middle != '-' || chars.next().is_some() {
        return None;
    }
    let endpoint1 = Endpoint::ALL.into_iter().find(|e| left_glyph(*e) == left)?;
    let endpoint2 = Endpoint::ALL.into_iter().find(|e| right_glyph(*e) == right)?;
    Some((endpoint1, endpoint2))
}

fn parse_error(line: usize, message: impl Into<String>) -> CausewayError {
    CausewayError::GraphParse {
        line,
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CausalGraph {
        let mut g = CausalGraph::with_nodes(["A", "B", "C", "D"]).expect("nodes");
        g.add_edge(Edge::directed("A", "B")).expect("edge");
        g.add_edge(Edge::nondirected("B", "C")).expect("edge");
        g.add_edge(Edge::partially_oriented("C", "D")).expect("edge");
        g.add_edge(Edge::bidirected("A", "D")).expect("edge");
        g
    }

    #[test]
    fn writes_nodes_then_numbered_edges() {
        let text = write_graph(&sample());
        assert!(text.starts_with("Graph Nodes:\nA;B;C;D\n\nGraph Edges:\n"));
        assert!(text.contains("1. A --> B\n"));
        assert!(text.contains("A <-> D"));
        assert!(text.contains("B o-o C"));
        assert!(text.contains("C o-> D"));
    }

    #[test]
    fn parse_inverts_write() {
        let g = sample();
        let parsed = parse_graph(&write_graph(&g)).expect("parse");
        assert_eq!(parsed, g);
    }

    #[test]
    fn edge_annotations_are_skipped() {
        let parsed =
            parse_graph("Graph Nodes:\nX;Y\n\nGraph Edges:\n1. X --> Y [X --> Y]:0.8\n")
                .expect("parse");
        assert_eq!(parsed.edge("X", "Y"), Some(&Edge::directed("X", "Y")));
    }

    #[test]
    fn null_and_star_glyphs_parse() {
        let parsed =
            parse_graph("Graph Nodes:\nX;Y\n\nGraph Edges:\n1. X *-. Y\n").expect("parse");
        assert_eq!(
            parsed.edge("X", "Y"),
            Some(&Edge::new("X", "Y", Endpoint::Star, Endpoint::Null))
        );
    }

    #[test]
    fn malformed_lines_report_line_numbers() {
        let err = parse_graph("Graph Nodes:\nX;Y\n\nGraph Edges:\n1. X => Y\n")
            .expect_err("bad glyph");
        assert!(matches!(err, CausewayError::GraphParse { line: 5, .. }));

        let err = parse_graph("Nodes:\nX\n").expect_err("bad header");
        assert!(matches!(err, CausewayError::GraphParse { line: 1, .. }));
    }

    #[test]
    fn unknown_edge_node_is_rejected() {
        let err = parse_graph("Graph Nodes:\nX\n\nGraph Edges:\n1. X --> Z\n")
            .expect_err("unknown node");
        assert!(matches!(err, CausewayError::NodeNotFound(ref n) if n == "Z"));
    }

    #[test]
    fn empty_graph_round_trips() {
        let g = CausalGraph::new();
        assert_eq!(parse_graph(&write_graph(&g)).expect("parse"), g);
    }
}
