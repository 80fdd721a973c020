//! # General Graph
//!
//! The alternate in-host graph representation, backed by a petgraph
//! `StableGraph`.
//!
//! It speaks its own endpoint vocabulary (`Mark`, numbered the way
//! causal-learn numbers endpoints) and, unlike `CausalGraph`, tolerates
//! parallel edges between the same pair of nodes. Converting it back
//! into a `CausalGraph` is where that gets rejected.

use crate::graph::{Edge, HasEdges, NodeNamed};
use crate::{CausewayError, Endpoint};
use petgraph::Undirected;
use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// MARK
// =============================================================================

/// Endpoint vocabulary of the alternate graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(i8)]
pub enum Mark {
    Tail = -1,
    Null = 0,
    Arrow = 1,
    Circle = 2,
    Star = 3,
}

impl Mark {
    /// Numeric value used in mark matrices.
    #[must_use]
    pub const fn value(self) -> i8 {
        self as i8
    }

    /// Mark for a numeric value.
    #[must_use]
    pub const fn from_value(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Self::Tail),
            0 => Some(Self::Null),
            1 => Some(Self::Arrow),
            2 => Some(Self::Circle),
            3 => Some(Self::Star),
            _ => None,
        }
    }
}

impl From<Endpoint> for Mark {
    fn from(endpoint: Endpoint) -> Self {
        match endpoint {
            Endpoint::Tail => Self::Tail,
            Endpoint::Null => Self::Null,
            Endpoint::Arrow => Self::Arrow,
            Endpoint::Circle => Self::Circle,
            Endpoint::Star => Self::Star,
        }
    }
}

impl From<Mark> for Endpoint {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::Tail => Self::Tail,
            Mark::Null => Self::Null,
            Mark::Arrow => Self::Arrow,
            Mark::Circle => Self::Circle,
            Mark::Star => Self::Star,
        }
    }
}

// =============================================================================
// GENERAL GRAPH
// =============================================================================

/// Edge weight: one mark per side, relative to petgraph's source/target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkedEdge {
    pub source_mark: Mark,
    pub target_mark: Mark,
}

/// Alternate graph object with named nodes and marked, possibly parallel,
/// edges.
#[derive(Debug, Clone, Default)]
pub struct GeneralGraph {
    graph: StableGraph<String, MarkedEdge, Undirected>,
    node_index: BTreeMap<String, NodeIndex>,
    order: Vec<NodeIndex>,
}

impl GeneralGraph {
    /// Create an edgeless graph over the given names.
    pub fn new<I, S>(names: I) -> Result<Self, CausewayError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut graph = Self::default();
        for name in names {
            graph.add_node(name)?;
        }
        Ok(graph)
    }

    /// Append a node.
    pub fn add_node(&mut self, name: impl Into<String>) -> Result<NodeIndex, CausewayError> {
        let name = name.into();
        if self.node_index.contains_key(&name) {
            return Err(CausewayError::DuplicateNode(name));
        }
        let idx = self.graph.add_node(name.clone());
        self.node_index.insert(name, idx);
        self.order.push(idx);
        Ok(idx)
    }

    /// Add a marked edge. Parallel edges are accepted.
    pub fn add_edge(
        &mut self,
        a: &str,
        b: &str,
        mark_a: Mark,
        mark_b: Mark,
    ) -> Result<(), CausewayError> {
        let ia = self.require(a)?;
        let ib = self.require(b)?;
        if ia == ib {
            return Err(CausewayError::SelfLoop(a.to_string()));
        }
        self.graph.add_edge(
            ia,
            ib,
            MarkedEdge {
                source_mark: mark_a,
                target_mark: mark_b,
            },
        );
        Ok(())
    }

    /// Node index by name.
    #[must_use]
    pub fn get_node(&self, name: &str) -> Option<NodeIndex> {
        self.node_index.get(name).copied()
    }

    /// Marks `(at a, at b)` on every edge joining `a` and `b`.
    #[must_use]
    pub fn marks(&self, a: &str, b: &str) -> Vec<(Mark, Mark)> {
        let (Some(ia), Some(ib)) = (self.get_node(a), self.get_node(b)) else {
            return Vec::new();
        };
        self.graph
            .edges_connecting(ia, ib)
            .filter_map(|e| {
                let (source, _) = self.graph.edge_endpoints(e.id())?;
                let w = e.weight();
                if source == ia {
                    Some((w.source_mark, w.target_mark))
                } else {
                    Some((w.target_mark, w.source_mark))
                }
            })
            .collect()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `p × p` mark matrix in node order: `m[i][j]` is the mark at node `i`
    /// on its edge to node `j`.
    ///
    /// # Errors
    /// `MultiEdge` if a pair carries more than one edge.
    pub fn to_mark_matrix(&self) -> Result<Vec<Vec<i8>>, CausewayError> {
        let p = self.order.len();
        let position: BTreeMap<NodeIndex, usize> =
            self.order.iter().enumerate().map(|(i, n)| (*n, i)).collect();
        let mut m = vec![vec![Mark::Null.value(); p]; p];
        let mut seen = vec![vec![false; p]; p];
        for e in self.graph.edge_indices() {
            let (Some((s, t)), Some(w)) = (self.graph.edge_endpoints(e), self.graph.edge_weight(e))
            else {
                continue;
            };
            let (Some(&i), Some(&j)) = (position.get(&s), position.get(&t)) else {
                continue;
            };
            if seen[i][j] {
                return Err(CausewayError::MultiEdge(
                    self.graph[s].clone(),
                    self.graph[t].clone(),
                ));
            }
            seen[i][j] = true;
            seen[j][i] = true;
            m[i][j] = w.source_mark.value();
            m[j][i] = w.target_mark.value();
        }
        Ok(m)
    }

    fn require(&self, name: &str) -> Result<NodeIndex, CausewayError> {
        self.get_node(name)
            .ok_or_else(|| CausewayError::NodeNotFound(name.to_string()))
    }
}

impl NodeNamed for GeneralGraph {
    fn node_names(&self) -> Vec<&str> {
        self.order
            .iter()
            .filter_map(|idx| self.graph.node_weight(*idx).map(String::as_str))
            .collect()
    }
}

impl HasEdges for GeneralGraph {
    fn edge_list(&self) -> Vec<Edge> {
        self.graph
            .edge_indices()
            .filter_map(|e| {
                let (s, t) = self.graph.edge_endpoints(e)?;
                let w = self.graph.edge_weight(e)?;
                Some(Edge::new(
                    &self.graph[s],
                    &self.graph[t],
                    w.source_mark.into(),
                    w.target_mark.into(),
                ))
            })
            .collect()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_mapping_is_total_and_invertible() {
        for endpoint in Endpoint::ALL {
            let mark = Mark::from(endpoint);
            assert_eq!(Endpoint::from(mark), endpoint);
            assert_eq!(Mark::from_value(mark.value()), Some(mark));
        }
        assert_eq!(Mark::from(Endpoint::Tail).value(), -1);
        assert_eq!(Mark::from_value(7), None);
    }

    #[test]
    fn mark_matrix_places_mark_at_row_node() {
        let mut graph = GeneralGraph::new(["A", "B"]).expect("nodes");
        graph
            .add_edge("A", "B", Mark::Tail, Mark::Arrow)
            .expect("edge");

        let m = graph.to_mark_matrix().expect("matrix");
        assert_eq!(m, vec![vec![0, -1], vec![1, 0]]);
        assert_eq!(graph.marks("B", "A"), vec![(Mark::Arrow, Mark::Tail)]);
    }

    #[test]
    fn parallel_edges_are_held_but_not_exported() {
        let mut graph = GeneralGraph::new(["A", "B"]).expect("nodes");
        graph
            .add_edge("A", "B", Mark::Tail, Mark::Arrow)
            .expect("edge");
        graph
            .add_edge("B", "A", Mark::Circle, Mark::Circle)
            .expect("edge");

        assert_eq!(graph.edge_count(), 2);
        assert_eq!(graph.edge_list().len(), 2);
        assert!(matches!(
            graph.to_mark_matrix(),
            Err(CausewayError::MultiEdge(..))
        ));
    }

    #[test]
    fn rejects_unknown_and_duplicate_nodes() {
        let mut graph = GeneralGraph::new(["A"]).expect("nodes");
        assert!(matches!(
            graph.add_edge("A", "Z", Mark::Tail, Mark::Arrow),
            Err(CausewayError::NodeNotFound(_))
        ));
        assert!(matches!(
            graph.add_node("A"),
            Err(CausewayError::DuplicateNode(_))
        ));
        assert!(matches!(
            graph.add_edge("A", "A", Mark::Tail, Mark::Arrow),
            Err(CausewayError::SelfLoop(_))
        ));
        assert_eq!(graph.node_names(), vec!["A"]);
    }
}
