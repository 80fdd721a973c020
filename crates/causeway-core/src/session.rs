//! # Session Module
//!
//! The explicit engine session every marshaller and search facade binds to.
//!
//! - `SearchEngine` is the seam to the external causal-search engine
//! - `EngineSession` owns one engine plus the marshalling defaults
//!   (`SessionConfig`) and tracks whether it is open
//! - `DetachedEngine` is a marshalling-only engine that cannot search
//!
//! ## Lifecycle
//!
//! `EngineSession::open` runs the engine's `open` hook; `close` runs its
//! `close` hook. Dropping a session that is still open closes it and logs
//! a failure instead of propagating it. Marshallers and `Search` borrow
//! the session, so it cannot be closed while one of them is alive.

use crate::dataset::TypedDataset;
use crate::graph::CausalGraph;
use crate::knowledge::{Knowledge, TierOrdering};
use crate::marshal::data::TypingPolicy;
use crate::matrix::EndpointCodes;
use crate::primitives::DEFAULT_COMMENT_MARKER;
use crate::search::{Algorithm, Parameters, ScoreSelection, TestSelection};
use crate::{CausewayError, EngineError};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// ENGINE SEAM
// =============================================================================

/// Everything the engine needs for one search call.
#[derive(Debug, Clone, Copy)]
pub struct SearchRequest<'a> {
    pub algorithm: &'a Algorithm,
    pub dataset: &'a TypedDataset,
    pub score: Option<&'a ScoreSelection>,
    pub test: Option<&'a TestSelection>,
    pub knowledge: &'a Knowledge,
    /// Hyperparameters under the engine's own parameter names.
    pub parameters: &'a Parameters,
}

/// What the engine returns from one search call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EngineOutput {
    pub graph: CausalGraph,
    /// One graph per bootstrap resample; empty when bootstrapping is off.
    pub bootstrap_graphs: Vec<CausalGraph>,
}

/// The external causal-structure-search engine.
///
/// Implementations never mutate the request's inputs.
pub trait SearchEngine: Send + Sync {
    /// Engine name, used in logs and errors.
    fn name(&self) -> &str;

    /// Called once when a session opens.
    fn open(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Called once when a session closes.
    fn close(&mut self) -> Result<(), EngineError> {
        Ok(())
    }

    /// Run one blocking search.
    fn search(&self, request: &SearchRequest<'_>) -> Result<EngineOutput, EngineError>;
}

/// An engine with no search capability, for marshalling-only sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedEngine;

impl SearchEngine for DetachedEngine {
    fn name(&self) -> &str {
        "detached"
    }

    fn search(&self, request: &SearchRequest<'_>) -> Result<EngineOutput, EngineError> {
        Err(EngineError::new(
            self.name(),
            format!(
                "no search engine attached, cannot run {}",
                request.algorithm.id()
            ),
        ))
    }
}

// =============================================================================
// SESSION CONFIG
// =============================================================================

/// Marshalling defaults carried by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Default typing policy for `DataMarshaller`.
    pub typing: TypingPolicy,
    /// Default code table for `GraphMarshaller`.
    pub endpoint_codes: EndpointCodes,
    /// Tier direction for knowledge built through `Search`.
    pub tier_ordering: TierOrdering,
    /// Comment marker for knowledge files.
    pub comment_marker: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            typing: TypingPolicy::default(),
            endpoint_codes: EndpointCodes::default(),
            tier_ordering: TierOrdering::default(),
            comment_marker: DEFAULT_COMMENT_MARKER.to_string(),
        }
    }
}

impl SessionConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), CausewayError> {
        if self.comment_marker.is_empty() {
            return Err(CausewayError::InvalidConfig {
                field: "comment_marker".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.comment_marker.chars().any(char::is_whitespace) {
            return Err(CausewayError::InvalidConfig {
                field: "comment_marker".to_string(),
                message: "must not contain whitespace".to_string(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// ENGINE SESSION
// =============================================================================

/// An open (or closed) connection to a search engine.
pub struct EngineSession {
    engine: Box<dyn SearchEngine>,
    config: SessionConfig,
    open: bool,
}

impl fmt::Debug for EngineSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineSession")
            .field("engine", &self.engine.name())
            .field("config", &self.config)
            .field("open", &self.open)
            .finish()
    }
}

impl EngineSession {
    /// Validate the config and open the engine.
    pub fn open(
        mut engine: Box<dyn SearchEngine>,
        config: SessionConfig,
    ) -> Result<Self, CausewayError> {
        config.validate()?;
        engine.open()?;
        tracing::info!(engine = engine.name(), "engine session opened");
        Ok(Self {
            engine,
            config,
            open: true,
        })
    }

    /// Marshalling-only session with default configuration.
    pub fn detached() -> Result<Self, CausewayError> {
        Self::open(Box::new(DetachedEngine), SessionConfig::default())
    }

    /// Close the engine. Closing twice is a no-op.
    ///
    /// If the engine's close hook fails the session stays open.
    pub fn close(&mut self) -> Result<(), CausewayError> {
        if !self.open {
            return Ok(());
        }
        self.engine.close()?;
        self.open = false;
        tracing::info!(engine = self.engine.name(), "engine session closed");
        Ok(())
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// `SessionClosed` unless the session is open.
    pub fn ensure_open(&self) -> Result<(), CausewayError> {
        if self.open {
            Ok(())
        } else {
            Err(CausewayError::SessionClosed)
        }
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Name of the attached engine.
    #[must_use]
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Dispatch one search to the engine.
    pub fn search(&self, request: &SearchRequest<'_>) -> Result<EngineOutput, CausewayError> {
        self.ensure_open()?;
        tracing::debug!(
            engine = self.engine.name(),
            algorithm = request.algorithm.id(),
            rows = request.dataset.n_rows(),
            cols = request.dataset.n_cols(),
            "dispatching search"
        );
        match self.engine.search(request) {
            Ok(output) => Ok(output),
            Err(e) => {
                tracing::error!(engine = %e.engine, error = %e.message, "engine search failed");
                Err(e.into())
            }
        }
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(engine = self.engine.name(), error = %e, "failed to close engine session");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
