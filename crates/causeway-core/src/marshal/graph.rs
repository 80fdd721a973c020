//! # GraphMarshaller
//!
//! Converts Typed Causal Graphs to and from Endpoint Matrices and the
//! alternate `GeneralGraph` representation.
//!
//! Encoding rule for an edge `(node1 = i, node2 = j, e1, e2)`:
//! `A[j][i] = code(e1)` and `A[i][j] = code(e2)`. An edge with a `NULL`
//! endpoint has no encoding: it would leave one cell of the pair NULL.

use crate::formats::{dot, lavaan, text, xml};
use crate::general::{GeneralGraph, Mark};
use crate::graph::{CausalGraph, Edge, HasEdges};
use crate::matrix::{EndpointCodes, EndpointMatrix};
use crate::session::EngineSession;
use crate::{CausewayError, Endpoint};

// =============================================================================
// MATRIX ENCODING
// =============================================================================

/// Encode any edge source into an Endpoint Matrix using its own node order.
pub fn graph_to_matrix<G: HasEdges + ?Sized>(
    graph: &G,
    codes: &EndpointCodes,
) -> Result<EndpointMatrix, CausewayError> {
    let names: Vec<String> = graph.node_names().into_iter().map(str::to_string).collect();
    encode(graph, names, codes)
}

/// Encode with an explicit node ordering.
///
/// # Errors
/// `ShapeMismatch` if the ordering has the wrong length, `NodeNotFound` or
/// `DuplicateNode` if it is not a permutation of the graph's nodes.
pub fn graph_to_matrix_ordered<G: HasEdges + ?Sized>(
    graph: &G,
    order: &[&str],
    codes: &EndpointCodes,
) -> Result<EndpointMatrix, CausewayError> {
    let own = graph.node_names();
    if order.len() != own.len() {
        return Err(CausewayError::ShapeMismatch {
            entity: "node ordering".to_string(),
            expected: own.len(),
            found: order.len(),
        });
    }
    for (i, name) in order.iter().enumerate() {
        if !own.contains(name) {
            return Err(CausewayError::NodeNotFound((*name).to_string()));
        }
        if order[..i].contains(name) {
            return Err(CausewayError::DuplicateNode((*name).to_string()));
        }
    }
    encode(graph, order.iter().map(|s| (*s).to_string()).collect(), codes)
}

fn encode<G: HasEdges + ?Sized>(
    graph: &G,
    names: Vec<String>,
    codes: &EndpointCodes,
) -> Result<EndpointMatrix, CausewayError> {
    let position = |name: &str| {
        names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| CausewayError::NodeNotFound(name.to_string()))
    };

    let edges = graph.edge_list();
    let mut placed: Vec<(usize, usize, Endpoint, Endpoint)> = Vec::with_capacity(edges.len());
    for edge in &edges {
        let i = position(&edge.node1)?;
        let j = position(&edge.node2)?;
        if i == j {
            return Err(CausewayError::SelfLoop(edge.node1.clone()));
        }
        if edge.has_null_endpoint() {
            return Err(CausewayError::UnencodableEdge(
                edge.node1.clone(),
                edge.node2.clone(),
            ));
        }
        if placed
            .iter()
            .any(|(a, b, _, _)| (*a == i && *b == j) || (*a == j && *b == i))
        {
            return Err(CausewayError::MultiEdge(
                edge.node1.clone(),
                edge.node2.clone(),
            ));
        }
        placed.push((i, j, edge.endpoint1, edge.endpoint2));
    }

    let p = names.len();
    let mut matrix = EndpointMatrix::new(names, vec![codes.null(); p * p])?;
    for (i, j, e1, e2) in placed {
        matrix.set(j, i, codes.encode(e1)?);
        matrix.set(i, j, codes.encode(e2)?);
    }
    Ok(matrix)
}

// =============================================================================
// MATRIX DECODING
// =============================================================================

/// Decode an Endpoint Matrix into a graph.
///
/// One edge per off-diagonal pair with at least one non-NULL cell, with
/// `node1` the lower index. Every cell is decoded.
pub fn matrix_to_graph(
    matrix: &EndpointMatrix,
    codes: &EndpointCodes,
) -> Result<CausalGraph, CausewayError> {
    let p = matrix.size();
    let null = codes.null();
    let decode = |row: usize, col: usize| -> Result<Endpoint, CausewayError> {
        let code = matrix.get(row, col).unwrap_or(null);
        codes
            .decode(code)
            .ok_or(CausewayError::UnknownEndpointCode { row, col, code })
    };

    let mut graph = CausalGraph::with_nodes(matrix.nodes().iter().cloned())?;
    for i in 0..p {
        let diagonal = decode(i, i)?;
        if !diagonal.is_null() {
            return Err(CausewayError::DiagonalEndpoint {
                index: i,
                code: matrix.get(i, i).unwrap_or(null),
            });
        }
        for j in (i + 1)..p {
            let e1 = decode(j, i)?;
            let e2 = decode(i, j)?;
            if e1.is_null() && e2.is_null() {
                continue;
            }
            graph.add_edge(Edge::new(
                &matrix.nodes()[i],
                &matrix.nodes()[j],
                e1,
                e2,
            ))?;
        }
    }
    Ok(graph)
}

// =============================================================================
// ALTERNATE GRAPH
// =============================================================================

/// Convert to the alternate graph, translating endpoints to marks.
pub fn graph_to_general(graph: &CausalGraph) -> Result<GeneralGraph, CausewayError> {
    let mut general = GeneralGraph::new(graph.nodes().iter().cloned())?;
    for edge in graph.edges() {
        general.add_edge(
            &edge.node1,
            &edge.node2,
            Mark::from(edge.endpoint1),
            Mark::from(edge.endpoint2),
        )?;
    }
    Ok(general)
}

/// Convert any edge source (typically a `GeneralGraph`) back into a
/// simple graph.
///
/// # Errors
/// `MultiEdge` if the source holds parallel edges.
pub fn general_to_graph<G: HasEdges + ?Sized>(source: &G) -> Result<CausalGraph, CausewayError> {
    let mut graph = CausalGraph::with_nodes(source.node_names())?;
    for edge in source.edge_list() {
        graph.add_edge(edge)?;
    }
    Ok(graph)
}

// =============================================================================
// ADJACENCY
// =============================================================================

/// Build a directed graph from a square 0/1 adjacency matrix.
///
/// Node names default to `X1..Xp`. A non-zero `a[i][j]` adds `i --> j`.
pub fn adjacency_to_graph(
    names: Option<&[String]>,
    adjacency: &[Vec<u8>],
) -> Result<CausalGraph, CausewayError> {
    let p = adjacency.len();
    for (i, row) in adjacency.iter().enumerate() {
        if row.len() != p {
            return Err(CausewayError::ShapeMismatch {
                entity: format!("adjacency row {i}"),
                expected: p,
                found: row.len(),
            });
        }
    }
    let names: Vec<String> = match names {
        Some(names) if names.len() != p => {
            return Err(CausewayError::ShapeMismatch {
                entity: "adjacency node names".to_string(),
                expected: p,
                found: names.len(),
            });
        }
        Some(names) => names.to_vec(),
        None => (1..=p).map(|i| format!("X{i}")).collect(),
    };

    let mut graph = CausalGraph::with_nodes(names.iter().cloned())?;
    for (i, row) in adjacency.iter().enumerate() {
        for (j, cell) in row.iter().enumerate() {
            if *cell == 0 {
                continue;
            }
            graph.add_edge(Edge::directed(&names[i], &names[j]))?;
        }
    }
    Ok(graph)
}

// =============================================================================
// GRAPH MARSHALLER
// =============================================================================

/// Session-bound graph marshaller.
///
/// Takes its code table from the session configuration.
#[derive(Debug, Clone, Copy)]
pub struct GraphMarshaller<'s> {
    session: &'s EngineSession,
    codes: EndpointCodes,
}

impl<'s> GraphMarshaller<'s> {
    /// Create a marshaller on an open session.
    pub fn new(session: &'s EngineSession) -> Result<Self, CausewayError> {
        session.ensure_open()?;
        Ok(Self {
            session,
            codes: session.config().endpoint_codes,
        })
    }

    /// Override the code table.
    #[must_use]
    pub fn with_codes(mut self, codes: EndpointCodes) -> Self {
        self.codes = codes;
        self
    }

    /// Active code table.
    #[must_use]
    pub fn codes(&self) -> &EndpointCodes {
        &self.codes
    }

    /// Graph → matrix in the graph's own node order.
    pub fn to_matrix<G: HasEdges + ?Sized>(
        &self,
        graph: &G,
    ) -> Result<EndpointMatrix, CausewayError> {
        self.session.ensure_open()?;
        let matrix = graph_to_matrix(graph, &self.codes)?;
        tracing::debug!(nodes = matrix.size(), "encoded endpoint matrix");
        Ok(matrix)
    }

    /// Graph → matrix over an explicit node permutation.
    pub fn to_matrix_ordered<G: HasEdges + ?Sized>(
        &self,
        graph: &G,
        order: &[&str],
    ) -> Result<EndpointMatrix, CausewayError> {
        self.session.ensure_open()?;
        graph_to_matrix_ordered(graph, order, &self.codes)
    }

    /// Matrix → graph.
    pub fn from_matrix(&self, matrix: &EndpointMatrix) -> Result<CausalGraph, CausewayError> {
        self.session.ensure_open()?;
        let graph = matrix_to_graph(matrix, &self.codes)?;
        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "decoded endpoint matrix"
        );
        Ok(graph)
    }

    /// Graph → alternate graph.
    pub fn to_alt_graph(&self, graph: &CausalGraph) -> Result<GeneralGraph, CausewayError> {
        self.session.ensure_open()?;
        graph_to_general(graph)
    }

    /// Alternate graph (or any edge source) → graph.
    pub fn from_alt_graph<G: HasEdges + ?Sized>(
        &self,
        source: &G,
    ) -> Result<CausalGraph, CausewayError> {
        self.session.ensure_open()?;
        general_to_graph(source)
    }

    /// Adjacency matrix → directed graph.
    pub fn from_adjacency(
        &self,
        names: Option<&[String]>,
        adjacency: &[Vec<u8>],
    ) -> Result<CausalGraph, CausewayError> {
        self.session.ensure_open()?;
        adjacency_to_graph(names, adjacency)
    }

    /// Graphviz DOT rendering.
    pub fn to_dot(&self, graph: &CausalGraph) -> Result<String, CausewayError> {
        self.session.ensure_open()?;
        dot::write_dot(graph)
    }

    /// lavaan model syntax.
    pub fn to_lavaan(&self, graph: &CausalGraph) -> Result<String, CausewayError> {
        self.session.ensure_open()?;
        lavaan::write_lavaan(graph)
    }

    /// Graph text: node list, then numbered edges.
    pub fn to_text(&self, graph: &CausalGraph) -> Result<String, CausewayError> {
        self.session.ensure_open()?;
        Ok(text::write_graph(graph))
    }

    /// Graph XML.
    pub fn to_xml(&self, graph: &CausalGraph) -> Result<String, CausewayError> {
        self.session.ensure_open()?;
        Ok(xml::write_xml(graph))
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{DetachedEngine, SessionConfig};

    fn two_nodes() -> CausalGraph {
        let mut graph = CausalGraph::with_nodes(["A", "B"]).expect("nodes");
        graph.add_edge(Edge::directed("A", "B")).expect("edge");
        graph
    }

    #[test]
    fn directed_edge_encodes_tail_below_diagonal() {
        let matrix = graph_to_matrix(&two_nodes(), &EndpointCodes::default()).expect("matrix");
        assert_eq!(matrix.rows(), vec![vec![0, 2], vec![3, 0]]);
    }

    #[test]
    fn decoding_restores_the_graph() {
        let codes = EndpointCodes::default();
        let mut graph = CausalGraph::with_nodes(["A", "B", "C"]).expect("nodes");
        graph
            .add_edge(Edge::partially_oriented("C", "A"))
            .expect("edge");
        graph.add_edge(Edge::bidirected("B", "C")).expect("edge");

        let matrix = graph_to_matrix(&graph, &codes).expect("matrix");
        assert_eq!(matrix.non_null_count(codes.null()), 4);
        assert!(matrix.is_structurally_symmetric(codes.null()));
        assert_eq!(matrix_to_graph(&matrix, &codes).expect("graph"), graph);
    }

    #[test]
    fn ordered_export_checks_the_permutation() {
        let codes = EndpointCodes::default();
        let graph = two_nodes();
        let matrix = graph_to_matrix_ordered(&graph, &["B", "A"], &codes).expect("matrix");
        assert_eq!(matrix.rows(), vec![vec![0, 3], vec![2, 0]]);
        assert_eq!(matrix_to_graph(&matrix, &codes).expect("graph").edge_count(), 1);

        assert!(matches!(
            graph_to_matrix_ordered(&graph, &["A"], &codes),
            Err(CausewayError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            graph_to_matrix_ordered(&graph, &["A", "Z"], &codes),
            Err(CausewayError::NodeNotFound(_))
        ));
        assert!(matches!(
            graph_to_matrix_ordered(&graph, &["A", "A"], &codes),
            Err(CausewayError::DuplicateNode(_))
        ));
    }

    #[test]
    fn star_and_unmarked_edges_fail_to_encode() {
        let codes = EndpointCodes::default();
        let mut star = CausalGraph::with_nodes(["A", "B"]).expect("nodes");
        star.add_edge(Edge::new("A", "B", Endpoint::Star, Endpoint::Arrow))
            .expect("edge");
        assert!(matches!(
            graph_to_matrix(&star, &codes),
            Err(CausewayError::UnmappedEndpoint { .. })
        ));

        let mut blank = CausalGraph::with_nodes(["A", "B"]).expect("nodes");
        blank
            .add_edge(Edge::new("A", "B", Endpoint::Null, Endpoint::Null))
            .expect("edge");
        assert!(matches!(
            graph_to_matrix(&blank, &codes),
            Err(CausewayError::UnencodableEdge(..))
        ));
    }

    #[test]
    fn half_null_edges_fail_on_every_encoding_path() {
        let codes = EndpointCodes::default();
        let mut graph = CausalGraph::with_nodes(["A", "B"]).expect("nodes");
        graph
            .add_edge(Edge::new("A", "B", Endpoint::Null, Endpoint::Arrow))
            .expect("edge");

        assert!(matches!(
            graph_to_matrix(&graph, &codes),
            Err(CausewayError::UnencodableEdge(..))
        ));
        assert!(matches!(
            graph_to_matrix_ordered(&graph, &["B", "A"], &codes),
            Err(CausewayError::UnencodableEdge(..))
        ));

        let session = EngineSession::open(Box::new(DetachedEngine), SessionConfig::default())
            .expect("session");
        let marshaller = GraphMarshaller::new(&session).expect("marshaller");
        assert!(matches!(
            marshaller.to_matrix(&graph),
            Err(CausewayError::UnencodableEdge(..))
        ));
    }

    #[test]
    fn parallel_edges_from_general_graph_are_rejected() {
        let mut general = GeneralGraph::new(["A", "B"]).expect("nodes");
        general
            .add_edge("A", "B", Mark::Tail, Mark::Arrow)
            .expect("edge");
        general
            .add_edge("A", "B", Mark::Arrow, Mark::Arrow)
            .expect("edge");

        assert!(matches!(
            graph_to_matrix(&general, &EndpointCodes::default()),
            Err(CausewayError::MultiEdge(..))
        ));
        assert!(matches!(
            general_to_graph(&general),
            Err(CausewayError::MultiEdge(..))
        ));
    }

    #[test]
    fn unknown_codes_and_diagonal_marks_are_fatal() {
        let codes = EndpointCodes::default();
        let nodes = vec!["A".to_string(), "B".to_string()];

        let unknown =
            EndpointMatrix::from_rows(nodes.clone(), &[vec![0, 9], vec![3, 0]]).expect("matrix");
        assert!(matches!(
            matrix_to_graph(&unknown, &codes),
            Err(CausewayError::UnknownEndpointCode {
                row: 0,
                col: 1,
                code: 9
            })
        ));

        let diagonal =
            EndpointMatrix::from_rows(nodes, &[vec![2, 0], vec![0, 0]]).expect("matrix");
        assert!(matches!(
            matrix_to_graph(&diagonal, &codes),
            Err(CausewayError::DiagonalEndpoint { index: 0, code: 2 })
        ));
    }

    #[test]
    fn one_sided_cells_become_null_endpoints() {
        let codes = EndpointCodes::default();
        let nodes = vec!["A".to_string(), "B".to_string()];
        let matrix =
            EndpointMatrix::from_rows(nodes, &[vec![0, 2], vec![0, 0]]).expect("matrix");

        let graph = matrix_to_graph(&matrix, &codes).expect("graph");
        let edge = graph.edge("A", "B").expect("edge");
        assert_eq!(edge.endpoint1, Endpoint::Null);
        assert_eq!(edge.endpoint2, Endpoint::Arrow);
    }

    #[test]
    fn adjacency_builds_directed_edges() {
        let graph =
            adjacency_to_graph(None, &[vec![0, 1, 0], vec![0, 0, 1], vec![0, 0, 0]])
                .expect("graph");
        assert_eq!(graph.nodes(), ["X1", "X2", "X3"]);
        assert_eq!(graph.edge("X1", "X2"), Some(&Edge::directed("X1", "X2")));
        assert_eq!(graph.edge("X3", "X2"), Some(&Edge::directed("X2", "X3")));

        assert!(matches!(
            adjacency_to_graph(None, &[vec![0, 1], vec![0]]),
            Err(CausewayError::ShapeMismatch { .. })
        ));
        assert!(matches!(
            adjacency_to_graph(None, &[vec![1]]),
            Err(CausewayError::SelfLoop(_))
        ));
        assert!(matches!(
            adjacency_to_graph(None, &[vec![0, 1], vec![1, 0]]),
            Err(CausewayError::MultiEdge(..))
        ));
    }

    #[test]
    fn marshaller_round_trips_through_alt_graph() {
        let session =
            EngineSession::open(Box::new(DetachedEngine), SessionConfig::default()).expect("open");
        let marshaller = GraphMarshaller::new(&session).expect("marshaller");

        let graph = two_nodes();
        let general = marshaller.to_alt_graph(&graph).expect("general");
        assert_eq!(general.to_mark_matrix().expect("marks"), vec![vec![0, -1], vec![1, 0]]);
        assert_eq!(marshaller.from_alt_graph(&general).expect("graph"), graph);

        let matrix = marshaller.to_matrix(&graph).expect("matrix");
        assert_eq!(marshaller.from_matrix(&matrix).expect("graph"), graph);
    }

    #[test]
    fn marshaller_uses_custom_codes() {
        let session =
            EngineSession::open(Box::new(DetachedEngine), SessionConfig::default()).expect("open");
        let codes = EndpointCodes::new(9, 1, 7, 5).expect("codes");
        let marshaller = GraphMarshaller::new(&session)
            .expect("marshaller")
            .with_codes(codes);

        let matrix = marshaller.to_matrix(&two_nodes()).expect("matrix");
        assert_eq!(matrix.rows(), vec![vec![9, 7], vec![5, 9]]);
    }
}
