//! # Graph Snapshots
//!
//! Binary serialization of a search result: the primary graph plus any
//! per-resample bootstrap graphs.
//!
//! Format: Header (5 bytes) + postcard-serialized payload.
//! - 4 bytes: Magic ("CWGS")
//! - 1 byte: Version
//!
//! ## Validation
//!
//! - Size limits and the header are checked before the payload is decoded
//! - Decoding rebuilds every graph through `add_node`/`add_edge`, so a
//!   corrupted payload cannot yield a graph that breaks its invariants
//!
//! File I/O is in the app layer.

use crate::graph::{CausalGraph, SerializableGraph};
use crate::primitives::{FORMAT_VERSION, HEADER_LEN, MAGIC_BYTES, MAX_SNAPSHOT_PAYLOAD_SIZE};
use crate::session::EngineOutput;
use crate::CausewayError;
use serde::{Deserialize, Serialize};

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all graph data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Header for the current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *MAGIC_BYTES,
            version: FORMAT_VERSION,
        }
    }

    /// Check magic bytes and version.
    pub fn validate(&self) -> Result<(), CausewayError> {
        if &self.magic != MAGIC_BYTES {
            return Err(CausewayError::DeserializationError(
                "snapshot: invalid magic bytes".to_string(),
            ));
        }
        if self.version != FORMAT_VERSION {
            return Err(CausewayError::DeserializationError(format!(
                "snapshot: unsupported version {} (expected {FORMAT_VERSION})",
                self.version
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];
        bytes[..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CausewayError> {
        let (Some(magic), Some(&version)) = (bytes.get(..4), bytes.get(4)) else {
            return Err(CausewayError::DeserializationError(format!(
                "snapshot: header needs {HEADER_LEN} bytes, found {}",
                bytes.len()
            )));
        };
        let mut header = Self::new();
        header.magic.copy_from_slice(magic);
        header.version = version;
        Ok(header)
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// PAYLOAD
// =============================================================================

#[derive(Serialize)]
struct PayloadRef<'a> {
    graph: &'a CausalGraph,
    bootstrap_graphs: &'a [CausalGraph],
}

#[derive(Deserialize)]
struct Payload {
    graph: SerializableGraph,
    bootstrap_graphs: Vec<SerializableGraph>,
}

/// Serialize a result graph and its bootstrap graphs (header + payload).
pub fn snapshot_to_bytes(
    graph: &CausalGraph,
    bootstrap_graphs: &[CausalGraph],
) -> Result<Vec<u8>, CausewayError> {
    let payload = postcard::to_stdvec(&PayloadRef {
        graph,
        bootstrap_graphs,
    })
    .map_err(|e| CausewayError::SerializationError(e.to_string()))?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&SnapshotHeader::new().to_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Deserialize a snapshot.
///
/// # Errors
/// `DeserializationError` for short, oversized or malformed input, and
/// the graph errors for payloads that violate graph invariants.
pub fn snapshot_from_bytes(bytes: &[u8]) -> Result<EngineOutput, CausewayError> {
    if bytes.len() > HEADER_LEN + MAX_SNAPSHOT_PAYLOAD_SIZE {
        return Err(CausewayError::DeserializationError(format!(
            "snapshot: {} bytes exceeds the {MAX_SNAPSHOT_PAYLOAD_SIZE} byte payload limit",
            bytes.len()
        )));
    }
    SnapshotHeader::from_bytes(bytes)?.validate()?;

    let payload: Payload = postcard::from_bytes(&bytes[HEADER_LEN..])
        .map_err(|e| CausewayError::DeserializationError(format!("snapshot payload: {e}")))?;

    let graph = CausalGraph::try_from(payload.graph)?;
    let bootstrap_graphs = payload
        .bootstrap_graphs
        .into_iter()
        .map(CausalGraph::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    tracing::debug!(
        nodes = graph.node_count(),
        resamples = bootstrap_graphs.len(),
        "snapshot decoded"
    );
    Ok(EngineOutput {
        graph,
        bootstrap_graphs,
    })
}

// =============================================================================
// TESTS
// =============================================================================
