//! # Endpoint Matrix
//!
//! Integer code table and the `p × p` matrix the engine-neutral graph
//! interchange uses.
//!
//! For an edge `(node1 = i, node2 = j, e1, e2)`:
//! - `A[j][i] = code(e1)`
//! - `A[i][j] = code(e2)`
//!
//! Absent edges hold the NULL code in both cells. The diagonal is NULL.

use crate::primitives::{
    DEFAULT_ARROW_CODE, DEFAULT_CIRCLE_CODE, DEFAULT_NULL_CODE, DEFAULT_TAIL_CODE,
    MAX_MATRIX_NODES,
};
use crate::{CausewayError, Endpoint};
use serde::{Deserialize, Serialize};

// =============================================================================
// ENDPOINT CODES
// =============================================================================

/// Code table between endpoint kinds and matrix integers.
///
/// The default table is NULL=0, CIRCLE=1, ARROW=2, TAIL=3 with STAR
/// unmapped. Codes are pairwise distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CodeTable", into = "CodeTable")]
pub struct EndpointCodes {
    null: i32,
    circle: i32,
    arrow: i32,
    tail: i32,
    star: Option<i32>,
}

/// Unvalidated wire form of `EndpointCodes`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct CodeTable {
    null: i32,
    circle: i32,
    arrow: i32,
    tail: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    star: Option<i32>,
}

impl TryFrom<CodeTable> for EndpointCodes {
    type Error = CausewayError;

    fn try_from(t: CodeTable) -> Result<Self, Self::Error> {
        match t.star {
            Some(star) => Self::with_star(t.null, t.circle, t.arrow, t.tail, star),
            None => Self::new(t.null, t.circle, t.arrow, t.tail),
        }
    }
}

impl From<EndpointCodes> for CodeTable {
    fn from(c: EndpointCodes) -> Self {
        Self {
            null: c.null,
            circle: c.circle,
            arrow: c.arrow,
            tail: c.tail,
            star: c.star,
        }
    }
}

impl Default for EndpointCodes {
    fn default() -> Self {
        Self {
            null: DEFAULT_NULL_CODE,
            circle: DEFAULT_CIRCLE_CODE,
            arrow: DEFAULT_ARROW_CODE,
            tail: DEFAULT_TAIL_CODE,
            star: None,
        }
    }
}

impl EndpointCodes {
    /// Code table without a STAR code.
    pub fn new(null: i32, circle: i32, arrow: i32, tail: i32) -> Result<Self, CausewayError> {
        let codes = Self {
            null,
            circle,
            arrow,
            tail,
            star: None,
        };
        codes.validate()?;
        Ok(codes)
    }

    /// Code table that also maps STAR.
    pub fn with_star(
        null: i32,
        circle: i32,
        arrow: i32,
        tail: i32,
        star: i32,
    ) -> Result<Self, CausewayError> {
        let codes = Self {
            null,
            circle,
            arrow,
            tail,
            star: Some(star),
        };
        codes.validate()?;
        Ok(codes)
    }

    fn validate(&self) -> Result<(), CausewayError> {
        let mapped: Vec<(Endpoint, i32)> = Endpoint::ALL
            .into_iter()
            .filter_map(|e| self.code_of(e).map(|c| (e, c)))
            .collect();
        for (i, (a, code_a)) in mapped.iter().enumerate() {
            if let Some((b, _)) = mapped[i + 1..].iter().find(|(_, c)| c == code_a) {
                return Err(CausewayError::DuplicateEndpointCode(*a, *b, *code_a));
            }
        }
        Ok(())
    }

    fn code_of(&self, endpoint: Endpoint) -> Option<i32> {
        match endpoint {
            Endpoint::Null => Some(self.null),
            Endpoint::Circle => Some(self.circle),
            Endpoint::Arrow => Some(self.arrow),
            Endpoint::Tail => Some(self.tail),
            Endpoint::Star => self.star,
        }
    }

    /// Code for the NULL endpoint.
    #[must_use]
    pub fn null(&self) -> i32 {
        self.null
    }

    /// Encode an endpoint.
    ///
    /// # Errors
    /// `UnmappedEndpoint` for STAR when the table has no STAR code.
    pub fn encode(&self, endpoint: Endpoint) -> Result<i32, CausewayError> {
        self.code_of(endpoint)
            .ok_or(CausewayError::UnmappedEndpoint {
                endpoint,
                vocabulary: "endpoint matrix",
            })
    }

    /// Decode a code, or `None` if the table does not contain it.
    #[must_use]
    pub fn decode(&self, code: i32) -> Option<Endpoint> {
        Endpoint::ALL
            .into_iter()
            .find(|e| self.code_of(*e) == Some(code))
    }
}

// =============================================================================
// ENDPOINT MATRIX
// =============================================================================

/// Square integer matrix over an explicit node order, row-major.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointMatrix {
    nodes: Vec<String>,
    cells: Vec<i32>,
}

impl EndpointMatrix {
    /// Build from node names and row-major cells.
    ///
    /// # Errors
    /// `ShapeMismatch` unless `cells.len() == p * p`, or if `p` exceeds
    /// `MAX_MATRIX_NODES`; `DuplicateNode` for repeated names.
    pub fn new(nodes: Vec<String>, cells: Vec<i32>) -> Result<Self, CausewayError> {
        let p = nodes.len();
        if p > MAX_MATRIX_NODES {
            return Err(CausewayError::ShapeMismatch {
                entity: "endpoint matrix nodes".to_string(),
                expected: MAX_MATRIX_NODES,
                found: p,
            });
        }
        if cells.len() != p * p {
            return Err(CausewayError::ShapeMismatch {
                entity: "endpoint matrix cells".to_string(),
                expected: p * p,
                found: cells.len(),
            });
        }
        for (i, name) in nodes.iter().enumerate() {
            if nodes[..i].contains(name) {
                return Err(CausewayError::DuplicateNode(name.clone()));
            }
        }
        Ok(Self { nodes, cells })
    }

    /// Build from nested rows.
    pub fn from_rows(nodes: Vec<String>, rows: &[Vec<i32>]) -> Result<Self, CausewayError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != nodes.len() {
                return Err(CausewayError::ShapeMismatch {
                    entity: format!("endpoint matrix row {i}"),
                    expected: nodes.len(),
                    found: row.len(),
                });
            }
        }
        Self::new(nodes, rows.concat())
    }

    pub(crate) fn set(&mut self, row: usize, col: usize, code: i32) {
        let p = self.size();
        if let Some(cell) = self.cells.get_mut(row * p + col) {
            *cell = code;
        }
    }

    /// Cell `[row][col]`.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<i32> {
        let p = self.size();
        if row >= p || col >= p {
            return None;
        }
        self.cells.get(row * p + col).copied()
    }

    /// Node order of the rows and columns.
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        &self.nodes
    }

    /// `p`, the number of nodes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Row-major cells.
    #[must_use]
    pub fn cells(&self) -> &[i32] {
        &self.cells
    }

    /// Rows as nested vectors.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<i32>> {
        let p = self.size();
        if p == 0 {
            return Vec::new();
        }
        self.cells.chunks(p).map(<[i32]>::to_vec).collect()
    }

    /// True if `[i][j]` is non-NULL exactly when `[j][i]` is.
    #[must_use]
    pub fn is_structurally_symmetric(&self, null: i32) -> bool {
        let p = self.size();
        (0..p).all(|i| {
            (0..p).all(|j| (self.get(i, j) != Some(null)) == (self.get(j, i) != Some(null)))
        })
    }

    /// Number of non-NULL cells.
    #[must_use]
    pub fn non_null_count(&self, null: i32) -> usize {
        self.cells.iter().filter(|c| **c != null).count()
    }
}

// =============================================================================
// TESTS
// =============================================================================
