//! # Typed Causal Graph
//!
//! The in-layer graph model returned by searches and consumed by the
//! GraphMarshaller.
//!
//! - Nodes are uniquely named and kept in insertion order
//! - Each edge joins two distinct nodes and carries one endpoint per side
//! - At most one edge per unordered node pair
//!
//! All internal maps are `BTreeMap` for deterministic iteration.
//!
//! ## Capability Traits
//!
//! Export paths accept any `HasEdges` source rather than probing objects
//! for node and edge listings at call time. Both `CausalGraph` and
//! `general::GeneralGraph` implement them.

use crate::{CausewayError, Endpoint};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// CAPABILITY TRAITS
// =============================================================================

/// Anything exposing an ordered list of node names.
pub trait NodeNamed {
    /// Node names in the source's own listing order.
    fn node_names(&self) -> Vec<&str>;
}

/// Anything exposing its edges as `Edge` values.
///
/// Implementations may report more than one edge per node pair; consumers
/// that need a simple graph must reject that themselves.
pub trait HasEdges: NodeNamed {
    /// Every edge, in the source's own order.
    fn edge_list(&self) -> Vec<Edge>;
}

// =============================================================================
// EDGE
// =============================================================================

/// An edge with one endpoint per side.
///
/// `endpoint1` sits at `node1`, `endpoint2` at `node2`. Equality ignores
/// which node is stored first: `A --> B` equals the same edge stored as
/// `(B, A, ARROW, TAIL)`.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub node1: String,
    pub node2: String,
    pub endpoint1: Endpoint,
    pub endpoint2: Endpoint,
}

impl Edge {
    /// Create an edge with explicit endpoints.
    #[must_use]
    pub fn new(
        node1: impl Into<String>,
        node2: impl Into<String>,
        endpoint1: Endpoint,
        endpoint2: Endpoint,
    ) -> Self {
        Self {
            node1: node1.into(),
            node2: node2.into(),
            endpoint1,
            endpoint2,
        }
    }

    /// `a --> b`
    #[must_use]
    pub fn directed(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, Endpoint::Tail, Endpoint::Arrow)
    }

    /// `a --- b`
    #[must_use]
    pub fn undirected(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, Endpoint::Tail, Endpoint::Tail)
    }

    /// `a <-> b`
    #[must_use]
    pub fn bidirected(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, Endpoint::Arrow, Endpoint::Arrow)
    }

    /// `a o-o b`
    #[must_use]
    pub fn nondirected(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, Endpoint::Circle, Endpoint::Circle)
    }

    /// `a o-> b`
    #[must_use]
    pub fn partially_oriented(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self::new(a, b, Endpoint::Circle, Endpoint::Arrow)
    }

    /// The same edge with its sides swapped.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self::new(&self.node2, &self.node1, self.endpoint2, self.endpoint1)
    }

    /// Endpoint at the named node, if the edge touches it.
    #[must_use]
    pub fn endpoint_at(&self, node: &str) -> Option<Endpoint> {
        if self.node1 == node {
            Some(self.endpoint1)
        } else if self.node2 == node {
            Some(self.endpoint2)
        } else {
            None
        }
    }

    /// True for `TAIL`/`ARROW` edges in either orientation.
    #[must_use]
    pub fn is_directed(&self) -> bool {
        matches!(
            (self.endpoint1, self.endpoint2),
            (Endpoint::Tail, Endpoint::Arrow) | (Endpoint::Arrow, Endpoint::Tail)
        )
    }

    /// True when either endpoint is `NULL`.
    #[must_use]
    pub fn has_null_endpoint(&self) -> bool {
        self.endpoint1.is_null() || self.endpoint2.is_null()
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        (self.node1 == other.node1
            && self.node2 == other.node2
            && self.endpoint1 == other.endpoint1
            && self.endpoint2 == other.endpoint2)
            || (self.node1 == other.node2
                && self.node2 == other.node1
                && self.endpoint1 == other.endpoint2
                && self.endpoint2 == other.endpoint1)
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.node1,
            left_glyph(self.endpoint1),
            right_glyph(self.endpoint2),
            self.node2
        )
    }
}

/// Glyph drawn next to `node1`.
pub(crate) const fn left_glyph(endpoint: Endpoint) -> char {
    match endpoint {
        Endpoint::Tail => '-',
        Endpoint::Arrow => '<',
        Endpoint::Circle => 'o',
        Endpoint::Null => '.',
        Endpoint::Star => '*',
    }
}

/// Glyph drawn next to `node2`.
pub(crate) const fn right_glyph(endpoint: Endpoint) -> char {
    match endpoint {
        Endpoint::Tail => '-',
        Endpoint::Arrow => '>',
        Endpoint::Circle => 'o',
        Endpoint::Null => '.',
        Endpoint::Star => '*',
    }
}

// =============================================================================
// CAUSAL GRAPH
// =============================================================================

/// A simple mixed graph over uniquely named nodes.
///
/// Edges are keyed by the unordered index pair `(low, high)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "SerializableGraph", into = "SerializableGraph")]
pub struct CausalGraph {
    nodes: Vec<String>,
    index: BTreeMap<String, usize>,
    edges: BTreeMap<(usize, usize), Edge>,
}

impl CausalGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an edgeless graph over the given nodes.
    pub fn with_nodes<I, S>(names: I) -> Result<Self, CausewayError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::new();
        for name in names {
            graph.add_node(name)?;
        }
        Ok(graph)
    }

    /// Append a node. Returns its index.
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<usize, CausewayError> {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(CausewayError::DuplicateNode(name));
        }
        let idx = self.nodes.len();
        self.index.insert(name.clone(), idx);
        self.nodes.push(name);
        Ok(idx)
    }

    /// Add an edge between two existing, distinct, not yet adjacent nodes.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), CausewayError> {
        let a = self.require_node(&edge.node1)?;
        let b = self.require_node(&edge.node2)?;
        if a == b {
            return Err(CausewayError::SelfLoop(edge.node1));
        }
        let key = (a.min(b), a.max(b));
        if self.edges.contains_key(&key) {
            return Err(CausewayError::MultiEdge(edge.node1, edge.node2));
        }
        self.edges.insert(key, edge);
        Ok(())
    }

    /// Remove the edge between two nodes, returning it.
    pub fn remove_edge(&mut self, a: &str, b: &str) -> Option<Edge> {
        let key = self.pair_key(a, b)?;
        self.edges.remove(&key)
    }

    /// Edge between two nodes, in either orientation.
    #[must_use]
    pub fn edge(&self, a: &str, b: &str) -> Option<&Edge> {
        self.edges.get(&self.pair_key(a, b)?)
    }

    /// True if an edge joins `a` and `b`.
    #[must_use]
    pub fn is_adjacent(&self, a: &str, b: &str) -> bool {
        self.edge(a, b).is_some()
    }

    /// Edges ordered by node-index pair.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Node names in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// Index of a node in the insertion order.
    #[must_use]
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// True if the graph has a node with this name.
    #[must_use]
    pub fn contains_node(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn require_node(&self, name: &str) -> Result<usize, CausewayError> {
        self.node_index(name)
            .ok_or_else(|| CausewayError::NodeNotFound(name.to_string()))
    }

    fn pair_key(&self, a: &str, b: &str) -> Option<(usize, usize)> {
        let a = self.node_index(a)?;
        let b = self.node_index(b)?;
        Some((a.min(b), a.max(b)))
    }
}

impl PartialEq for CausalGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes
            && self.edges.len() == other.edges.len()
            && self
                .edges
                .iter()
                .all(|(key, edge)| other.edges.get(key) == Some(edge))
    }
}

impl Eq for CausalGraph {}

impl NodeNamed for CausalGraph {
    fn node_names(&self) -> Vec<&str> {
        self.nodes.iter().map(String::as_str).collect()
    }
}

impl HasEdges for CausalGraph {
    fn edge_list(&self) -> Vec<Edge> {
        self.edges.values().cloned().collect()
    }
}

// =============================================================================
// SERIALIZABLE GRAPH
// =============================================================================

/// Wire form of a `CausalGraph`.
///
/// Decoding goes back through `add_node`/`add_edge`, so a tampered
/// payload cannot produce a graph that violates the invariants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableGraph {
    pub nodes: Vec<String>,
    pub edges: Vec<Edge>,
}

impl From<CausalGraph> for SerializableGraph {
    fn from(graph: CausalGraph) -> Self {
        Self {
            edges: graph.edges.into_values().collect(),
            nodes: graph.nodes,
        }
    }
}

impl TryFrom<SerializableGraph> for CausalGraph {
    type Error = CausewayError;

    fn try_from(wire: SerializableGraph) -> Result<Self, Self::Error> {
        let mut graph = CausalGraph::with_nodes(wire.nodes)?;
        for edge in wire.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> CausalGraph {
        let mut graph = CausalGraph::with_nodes(["A", "B", "C"]).expect("nodes");
        graph.add_edge(Edge::directed("A", "B")).expect("edge");
        graph.add_edge(Edge::nondirected("C", "B")).expect("edge");
        graph
    }

    #[test]
    fn edge_equality_ignores_storage_order() {
        let edge = Edge::directed("A", "B");
        assert_eq!(edge, edge.reversed());
        assert_ne!(edge, Edge::directed("B", "A"));
        assert_eq!(edge.endpoint_at("B"), Some(Endpoint::Arrow));
        assert_eq!(edge.endpoint_at("Z"), None);
    }

    #[test]
    fn edge_display_uses_glyphs() {
        assert_eq!(Edge::directed("A", "B").to_string(), "A --> B");
        assert_eq!(Edge::partially_oriented("A", "B").to_string(), "A o-> B");
        assert_eq!(Edge::bidirected("A", "B").to_string(), "A <-> B");
        assert_eq!(Edge::undirected("A", "B").to_string(), "A --- B");
    }

    #[test]
    fn add_edge_rejects_invalid_edges() {
        let mut graph = chain();
        assert!(matches!(
            graph.add_edge(Edge::directed("B", "A")),
            Err(CausewayError::MultiEdge(..))
        ));
        assert!(matches!(
            graph.add_edge(Edge::directed("A", "A")),
            Err(CausewayError::SelfLoop(name)) if name == "A"
        ));
        assert!(matches!(
            graph.add_edge(Edge::directed("A", "Z")),
            Err(CausewayError::NodeNotFound(name)) if name == "Z"
        ));
        assert!(matches!(
            graph.add_node("B"),
            Err(CausewayError::DuplicateNode(name)) if name == "B"
        ));
    }

    #[test]
    fn lookups_are_orientation_free() {
        let graph = chain();
        assert!(graph.is_adjacent("B", "A"));
        assert!(!graph.is_adjacent("A", "C"));
        assert_eq!(graph.edge("B", "C"), Some(&Edge::nondirected("B", "C")));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn remove_edge_frees_the_pair() {
        let mut graph = chain();
        let removed = graph.remove_edge("B", "A").expect("edge");
        assert!(removed.is_directed());
        assert!(graph.add_edge(Edge::bidirected("A", "B")).is_ok());
    }

    #[test]
    fn equality_compares_edge_sets() {
        let mut other = CausalGraph::with_nodes(["A", "B", "C"]).expect("nodes");
        other
            .add_edge(Edge::nondirected("B", "C"))
            .expect("edge");
        other.add_edge(Edge::directed("A", "B").reversed()).expect("edge");
        assert_eq!(chain(), other);

        let reordered = CausalGraph::with_nodes(["B", "A", "C"]).expect("nodes");
        assert_ne!(CausalGraph::with_nodes(["A", "B", "C"]).expect("nodes"), reordered);
    }

    #[test]
    fn serde_revalidates_edges() {
        let json = serde_json::to_string(&chain()).expect("serialize");
        let back: CausalGraph = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, chain());

        let tampered = r#"{"nodes":["A","B"],"edges":[
            {"node1":"A","node2":"B","endpoint1":"TAIL","endpoint2":"ARROW"},
            {"node1":"B","node2":"A","endpoint1":"TAIL","endpoint2":"ARROW"}]}"#;
        assert!(serde_json::from_str::<CausalGraph>(tampered).is_err());
    }

    #[test]
    fn capability_traits_list_nodes_and_edges() {
        let graph = chain();
        assert_eq!(graph.node_names(), vec!["A", "B", "C"]);
        assert_eq!(graph.edge_list().len(), 2);
    }
}
