//! # Core Type Definitions
//!
//! This module contains the small vocabulary shared by every marshaller:
//! - The canonical endpoint tag (`Endpoint`)
//! - The column kind tag (`VariableKind`)
//! - Error types (`CausewayError`, `EngineError`)
//!
//! ## Single Endpoint Vocabulary
//!
//! `Endpoint` is defined once. Every external vocabulary (matrix codes,
//! `general::Mark`, DOT arrow styles, graph text glyphs) is reached through
//! a mapping function on this enum, never through ad hoc string maps.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// =============================================================================
// ENDPOINT
// =============================================================================

/// The mark placed at one end of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Endpoint {
    /// Plain tail (`-`).
    Tail,
    /// Arrowhead (`>` / `<`).
    Arrow,
    /// Circle, an undetermined mark (`o`).
    Circle,
    /// Absence-capable placeholder.
    Null,
    /// Wildcard, used only by some alternate representations.
    Star,
}

impl Endpoint {
    /// Every endpoint kind, in declaration order.
    pub const ALL: [Endpoint; 5] = [
        Endpoint::Tail,
        Endpoint::Arrow,
        Endpoint::Circle,
        Endpoint::Null,
        Endpoint::Star,
    ];

    /// Engine-side name of the endpoint kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Tail => "TAIL",
            Self::Arrow => "ARROW",
            Self::Circle => "CIRCLE",
            Self::Null => "NULL",
            Self::Star => "STAR",
        }
    }

    /// Parse an engine-side name (case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|e| e.name().eq_ignore_ascii_case(name))
    }

    /// True for the NULL placeholder.
    #[must_use]
    pub const fn is_null(self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// VARIABLE KIND
// =============================================================================

/// Kind tag of a typed column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Real-valued.
    Continuous,
    /// Categorical, stored as integer codes.
    Discrete,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continuous => f.write_str("continuous"),
            Self::Discrete => f.write_str("discrete"),
        }
    }
}

// =============================================================================
// ENGINE ERROR
// =============================================================================

/// A failure raised by the external search engine.
///
/// The interchange layer does not interpret engine failures; it carries
/// the engine's name and message back to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{engine}: {message}")]
pub struct EngineError {
    /// Name of the engine that failed.
    pub engine: String,
    /// Engine-supplied description.
    pub message: String,
}

impl EngineError {
    /// Create a new engine error.
    #[must_use]
    pub fn new(engine: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            engine: engine.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Causeway interchange layer.
///
/// - No silent failures
/// - Every variant names the entity and the violated invariant
/// - All of these are detected locally, before a call reaches the engine
///   (except `Engine`, which is propagated from it)
#[derive(Debug, Error)]
pub enum CausewayError {
    /// A column's dtype does not map unambiguously to a variable kind.
    #[error("column {column}: ambiguous type ({reason})")]
    AmbiguousType { column: String, reason: String },

    /// A cell does not match the dtype declared for its column.
    #[error("column {column}, row {row}: expected a {expected} cell")]
    CellTypeMismatch {
        column: String,
        row: usize,
        expected: String,
    },

    /// Dimensions disagree with declared column/node counts.
    #[error("{entity}: shape mismatch (expected {expected}, found {found})")]
    ShapeMismatch {
        entity: String,
        expected: usize,
        found: usize,
    },

    /// A dataset's storage layout disagrees with its column kinds.
    #[error("dataset storage: column kinds require {expected} storage, found {found}")]
    StorageMismatch { expected: String, found: String },

    /// Two columns share a name.
    #[error("column {0}: duplicate column name")]
    DuplicateColumn(String),

    /// Two nodes share a name.
    #[error("node {0}: duplicate node name")]
    DuplicateNode(String),

    /// A referenced node does not exist.
    #[error("node {0}: not found")]
    NodeNotFound(String),

    /// An edge would join a node to itself.
    #[error("node {0}: self loops are not allowed")]
    SelfLoop(String),

    /// More than one edge on the same unordered node pair.
    #[error("node pair ({0},{1}): more than one edge")]
    MultiEdge(String, String),

    /// An edge carries NULL on at least one side and cannot be encoded.
    #[error("node pair ({0},{1}): edge has a NULL endpoint")]
    UnencodableEdge(String, String),

    /// A matrix cell holds a code outside the active code table.
    #[error("matrix cell [{row}][{col}]: unknown endpoint code {code}")]
    UnknownEndpointCode { row: usize, col: usize, code: i32 },

    /// A diagonal matrix cell holds a non-NULL code.
    #[error("matrix cell [{index}][{index}]: diagonal must hold the NULL code, found {code}")]
    DiagonalEndpoint { index: usize, code: i32 },

    /// An endpoint kind has no image in a target vocabulary.
    #[error("endpoint {endpoint}: no mapping in {vocabulary}")]
    UnmappedEndpoint {
        endpoint: Endpoint,
        vocabulary: &'static str,
    },

    /// An edge kind cannot be expressed in a target format.
    #[error("node pair ({node1},{node2}): edge cannot be expressed in {format}")]
    UnsupportedEdge {
        node1: String,
        node2: String,
        format: &'static str,
    },

    /// A code table maps two endpoint kinds to the same integer.
    #[error("endpoint codes: {0} and {1} share code {2}")]
    DuplicateEndpointCode(Endpoint, Endpoint, i32),

    /// A variable was assigned to two different tiers.
    #[error("variable {variable}: already in tier {existing}, cannot add to tier {requested}")]
    TierConflict {
        variable: String,
        existing: usize,
        requested: usize,
    },

    /// An edge is both forbidden and required.
    #[error("node pair ({0},{1}): contradictory forbidden/required knowledge")]
    ContradictoryKnowledge(String, String),

    /// A knowledge rule names the same variable twice.
    #[error("variable {0}: knowledge rule cannot relate a variable to itself")]
    ReflexiveRule(String),

    /// A knowledge file line could not be parsed.
    #[error("knowledge line {line}: {message}")]
    KnowledgeParse { line: usize, message: String },

    /// A graph text line could not be parsed.
    #[error("graph text line {line}: {message}")]
    GraphParse { line: usize, message: String },

    /// A delimited text line could not be parsed.
    #[error("delimited text line {line}: {message}")]
    DelimitedParse { line: usize, message: String },

    /// A search was run before any score or test was selected.
    #[error("search: no score or test selected")]
    NotConfigured,

    /// A result accessor was called before any successful run.
    #[error("search: no result available, run a search first")]
    NoResult,

    /// An algorithm needs a selection that has not been made.
    #[error("algorithm {algorithm}: requires a {needs}")]
    MissingSelection {
        algorithm: &'static str,
        needs: &'static str,
    },

    /// An algorithm cannot use background knowledge.
    #[error("algorithm {0}: does not use knowledge, clear it first")]
    KnowledgeUnsupported(&'static str),

    /// A hyperparameter is out of range.
    #[error("parameter {name}: {message}")]
    InvalidParameter { name: String, message: String },

    /// A configuration value is invalid.
    #[error("config {field}: {message}")]
    InvalidConfig { field: String, message: String },

    /// An index is outside the valid range.
    #[error("{entity}: index {index} out of range (len {len})")]
    IndexOutOfRange {
        entity: &'static str,
        index: usize,
        len: usize,
    },

    /// The engine session has been closed.
    #[error("engine session is closed")]
    SessionClosed,

    /// The external engine failed.
    #[error("engine failure: {0}")]
    Engine(#[from] EngineError),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_names_roundtrip() {
        for endpoint in Endpoint::ALL {
            assert_eq!(Endpoint::from_name(endpoint.name()), Some(endpoint));
        }
        assert_eq!(Endpoint::from_name("arrow"), Some(Endpoint::Arrow));
        assert_eq!(Endpoint::from_name("dot"), None);
    }

    #[test]
    fn endpoint_display_uses_engine_name() {
        assert_eq!(Endpoint::Circle.to_string(), "CIRCLE");
        assert!(Endpoint::Null.is_null());
        assert!(!Endpoint::Star.is_null());
    }

    #[test]
    fn errors_name_the_entity() {
        let err = CausewayError::AmbiguousType {
            column: "x".to_string(),
            reason: "object column holds float cells".to_string(),
        };
        assert!(err.to_string().starts_with("column x: ambiguous type"));

        let err = CausewayError::ContradictoryKnowledge("A".to_string(), "B".to_string());
        assert_eq!(
            err.to_string(),
            "node pair (A,B): contradictory forbidden/required knowledge"
        );
    }

    #[test]
    fn engine_error_converts() {
        let err: CausewayError = EngineError::new("remote", "out of memory").into();
        assert_eq!(err.to_string(), "engine failure: remote: out of memory");
    }
}
