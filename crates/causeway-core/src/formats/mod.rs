//! # Formats
//!
//! Textual and binary renderings of the interchange types.
//!
//! Every function here is a pure transformation between values and
//! strings/bytes. File I/O lives in the app layer.
//!
//! - `text`: graph text (`Graph Nodes:` / `Graph Edges:`)
//! - `dot`: Graphviz DOT
//! - `lavaan`: lavaan model syntax
//! - `knowledge`: knowledge files
//! - `delimited`: delimited host frames and endpoint matrices
//! - `persistence`: binary graph snapshots
//! - `xml`: graph XML (write only)

pub mod delimited;
pub mod dot;
pub mod knowledge;
pub mod lavaan;
pub mod persistence;
pub mod text;
pub mod xml;

pub use persistence::{SnapshotHeader, snapshot_from_bytes, snapshot_to_bytes};
