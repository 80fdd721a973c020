//! # causeway-core
//!
//! The interchange layer between a host data environment and an external
//! causal-structure-search engine.
//!
//! It converts in both directions between:
//! - Host frames and typed datasets (`marshal::data`)
//! - Causal graphs, endpoint matrices and alternate graphs (`marshal::graph`)
//! - Background knowledge and its file form (`knowledge`, `formats::knowledge`)
//!
//! and offers a search configuration facade (`search::Search`) that
//! accumulates a score, a test, knowledge and bootstrap settings before
//! dispatching to the engine through an explicit `EngineSession`.
//!
//! ## Constraints
//!
//! - Synchronous and single-threaded; the engine call blocks
//! - No global state: every marshaller borrows an `EngineSession`
//! - Deterministic: all maps are `BTreeMap`, all listings are ordered
//! - No silent failures: every invariant breach is a `CausewayError`

// =============================================================================
// MODULES
// =============================================================================

pub mod dataset;
pub mod formats;
pub mod frame;
pub mod general;
pub mod graph;
pub mod knowledge;
pub mod marshal;
pub mod matrix;
pub mod primitives;
pub mod search;
pub mod session;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{CausewayError, Endpoint, EngineError, VariableKind};

// =============================================================================
// RE-EXPORTS: Data
// =============================================================================

pub use dataset::{CategoryMap, CategoryValue, DataBox, StorageMode, TypedColumn, TypedDataset};
pub use frame::{Cell, Dtype, HostColumn, HostFrame};

// =============================================================================
// RE-EXPORTS: Graphs
// =============================================================================

pub use general::{GeneralGraph, Mark};
pub use graph::{CausalGraph, Edge, HasEdges, NodeNamed};
pub use matrix::{EndpointCodes, EndpointMatrix};

// =============================================================================
// RE-EXPORTS: Marshallers, Knowledge, Search
// =============================================================================

pub use knowledge::{Knowledge, KnowledgeBuilder, TierOrdering};
pub use marshal::{DataMarshaller, GraphMarshaller, TypingPolicy};
pub use search::{Algorithm, Bootstrap, ScoreSelection, Search, SearchState, TestSelection};
pub use session::{DetachedEngine, EngineOutput, EngineSession, SearchEngine, SearchRequest, SessionConfig};
