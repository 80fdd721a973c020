//! # Search Configuration Facade
//!
//! `Search` accumulates a score and/or test selection, background
//! knowledge and bootstrap settings for one dataset, then dispatches a
//! search to the engine through an `EngineSession`.
//!
//! ## State Machine
//!
//! ```text
//! Unconfigured --use_score/use_test--> Configured --run--> Ran --run--> Ran
//! ```
//!
//! Running with nothing selected is `NotConfigured` unless the algorithm
//! runs on the data alone (`Requirement::Neither`). Each algorithm also
//! checks the specific selections it needs (`MissingSelection`).

pub mod algorithm;
pub mod bootstrap;
pub mod parameters;
pub mod selection;

pub use algorithm::{
    Algorithm, FciOptions, GraspOptions, IcaOptions, KnowledgeUse, PcOptions, Requirement,
    SkewRule,
};
pub use bootstrap::{Bootstrap, Ensemble};
pub use parameters::{ParamValue, Parameters, names};
pub use selection::{ScoreSelection, TestSelection};

use crate::dataset::TypedDataset;
use crate::formats::{dot, knowledge as knowledge_file, lavaan, text, xml};
use crate::frame::HostFrame;
use crate::general::GeneralGraph;
use crate::graph::CausalGraph;
use crate::knowledge::{Knowledge, KnowledgeBuilder};
use crate::marshal::data::DataMarshaller;
use crate::marshal::graph::{graph_to_general, graph_to_matrix};
use crate::matrix::EndpointMatrix;
use crate::session::{EngineOutput, EngineSession, SearchRequest};
use crate::CausewayError;

// =============================================================================
// PARAMETER CHECKS
// =============================================================================

fn invalid(name: &str, message: String) -> CausewayError {
    CausewayError::InvalidParameter {
        name: name.to_string(),
        message,
    }
}

/// `0 < value < 1`
fn check_unit_interval(name: &str, value: f64) -> Result<(), CausewayError> {
    if value > 0.0 && value < 1.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be in (0, 1), got {value}")))
    }
}

/// `value > 0`, finite
fn check_positive(name: &str, value: f64) -> Result<(), CausewayError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be positive, got {value}")))
    }
}

/// `value >= 0`, finite
fn check_non_negative(name: &str, value: f64) -> Result<(), CausewayError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, format!("must be non-negative, got {value}")))
    }
}

fn check_at_least(name: &str, value: i64, min: i64) -> Result<(), CausewayError> {
    if value >= min {
        Ok(())
    } else {
        Err(invalid(name, format!("must be at least {min}, got {value}")))
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// Where a `Search` is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchState {
    /// No score or test selected yet.
    Unconfigured,
    /// At least one selection made, no successful run yet.
    Configured,
    /// A run has stored a result.
    Ran,
}

/// Search configuration facade over one dataset.
#[derive(Debug)]
pub struct Search<'s> {
    session: &'s EngineSession,
    dataset: TypedDataset,
    score: Option<ScoreSelection>,
    test: Option<TestSelection>,
    parameters: Parameters,
    knowledge: KnowledgeBuilder,
    bootstrap: Bootstrap,
    result: Option<EngineOutput>,
}

impl<'s> Search<'s> {
    /// Create a facade over an already typed dataset.
    pub fn new(session: &'s EngineSession, dataset: TypedDataset) -> Result<Self, CausewayError> {
        session.ensure_open()?;
        let mut parameters = Parameters::new();
        let bootstrap = Bootstrap::default();
        bootstrap.apply(&mut parameters);
        parameters.set(names::VERBOSE, false);
        parameters.set(names::TIME_LAG, 0_i64);
        Ok(Self {
            session,
            dataset,
            score: None,
            test: None,
            parameters,
            knowledge: KnowledgeBuilder::with_ordering(session.config().tier_ordering),
            bootstrap,
            result: None,
        })
    }

    /// Create a facade from a host frame, typed under the session policy.
    pub fn from_frame(session: &'s EngineSession, frame: &HostFrame) -> Result<Self, CausewayError> {
        let dataset = DataMarshaller::new(session)?.to_typed_dataset(frame)?;
        Self::new(session, dataset)
    }

    // -------------------------------------------------------------------------
    // Selections
    // -------------------------------------------------------------------------

    /// Select a score, replacing any earlier score.
    pub fn use_score(&mut self, score: ScoreSelection) -> Result<(), CausewayError> {
        score.validate()?;
        score.apply(&mut self.parameters);
        tracing::debug!(score = score.id(), "score selected");
        self.score = Some(score);
        Ok(())
    }

    /// Select a test, replacing any earlier test.
    pub fn use_test(&mut self, test: TestSelection) -> Result<(), CausewayError> {
        test.validate()?;
        test.apply(&mut self.parameters);
        tracing::debug!(test = test.id(), "test selected");
        self.test = Some(test);
        Ok(())
    }

    /// Configure bootstrapping. Zero resamples turns it off.
    pub fn set_bootstrapping(&mut self, bootstrap: Bootstrap) -> Result<(), CausewayError> {
        bootstrap.validate()?;
        bootstrap.apply(&mut self.parameters);
        self.bootstrap = bootstrap;
        Ok(())
    }

    pub fn set_verbose(&mut self, verbose: bool) {
        self.parameters.set(names::VERBOSE, verbose);
    }

    /// Lag count for time-series algorithms that do not carry their own.
    pub fn set_time_lag(&mut self, time_lag: usize) {
        self.parameters.set(names::TIME_LAG, time_lag);
    }

    /// Replace the dataset. Any stored result is dropped.
    pub fn set_data(&mut self, dataset: TypedDataset) {
        self.dataset = dataset;
        self.result = None;
    }

    // -------------------------------------------------------------------------
    // Knowledge
    // -------------------------------------------------------------------------

    pub fn add_to_tier(&mut self, tier: usize, name: &str) -> Result<(), CausewayError> {
        self.knowledge.add_to_tier(tier, name)
    }

    pub fn set_tier_forbidden_within(&mut self, tier: usize, forbidden: bool) {
        self.knowledge.set_tier_forbidden_within(tier, forbidden);
    }

    pub fn set_tier_only_next(&mut self, tier: usize, only_next: bool) {
        self.knowledge.set_tier_only_next(tier, only_next);
    }

    pub fn forbid(&mut self, a: &str, b: &str) -> Result<(), CausewayError> {
        self.knowledge.forbid(a, b)
    }

    pub fn require(&mut self, a: &str, b: &str) -> Result<(), CausewayError> {
        self.knowledge.require(a, b)
    }

    pub fn clear_knowledge(&mut self) {
        self.knowledge.clear();
    }

    /// Replace the knowledge wholesale.
    pub fn set_knowledge(&mut self, knowledge: KnowledgeBuilder) {
        self.knowledge = knowledge;
    }

    /// Replace the knowledge with the contents of a knowledge file.
    ///
    /// Uses the session's comment marker and tier ordering. Variables the
    /// dataset lacks are logged, not rejected.
    pub fn load_knowledge(&mut self, source: &str) -> Result<(), CausewayError> {
        let config = self.session.config();
        let mut builder = knowledge_file::parse_knowledge(source, &config.comment_marker)?;
        builder.set_ordering(config.tier_ordering);
        self.knowledge = builder;
        let unknown = self.check_knowledge();
        if !unknown.is_empty() {
            tracing::warn!(variables = ?unknown, "knowledge names variables missing from the data");
        }
        Ok(())
    }

    /// Knowledge variables that are not dataset variables, sorted.
    #[must_use]
    pub fn check_knowledge(&self) -> Vec<String> {
        let variables: Vec<&str> = self.dataset.variable_names().collect();
        self.knowledge.check(&variables)
    }

    #[must_use]
    pub fn knowledge(&self) -> &Knowledge {
        self.knowledge.knowledge()
    }

    // -------------------------------------------------------------------------
    // Run
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn state(&self) -> SearchState {
        if self.result.is_some() {
            SearchState::Ran
        } else if self.score.is_some() || self.test.is_some() {
            SearchState::Configured
        } else {
            SearchState::Unconfigured
        }
    }

    /// Run an algorithm and store its result.
    ///
    /// Precondition failures keep the previous result; an engine failure
    /// drops it.
    ///
    /// # Errors
    /// - `NotConfigured` if the algorithm needs a selection and none was made
    /// - `MissingSelection` if the specific selection it needs is missing
    /// - `KnowledgeUnsupported` if it rejects knowledge and some is set
    /// - `InvalidParameter` for out-of-range options
    /// - `Engine` for engine failures
    pub fn run(&mut self, algorithm: &Algorithm) -> Result<&CausalGraph, CausewayError> {
        self.session.ensure_open()?;
        self.check_selections(algorithm)?;
        algorithm.validate()?;

        let empty = Knowledge::default();
        let knowledge = match algorithm.knowledge_use() {
            KnowledgeUse::Used => self.knowledge.knowledge(),
            KnowledgeUse::Ignored => {
                if !self.knowledge.knowledge().is_empty() {
                    tracing::warn!(algorithm = algorithm.id(), "algorithm ignores knowledge");
                }
                &empty
            }
            KnowledgeUse::Rejected => {
                if !self.knowledge.knowledge().is_empty() {
                    return Err(CausewayError::KnowledgeUnsupported(algorithm.id()));
                }
                &empty
            }
        };

        let mut parameters = self.parameters.clone();
        algorithm.apply(&mut parameters);
        if algorithm.is_lagged() {
            let lag = parameters.int(names::TIME_LAG).unwrap_or(0);
            check_at_least(names::TIME_LAG, lag, 1)?;
        }

        // Once dispatched, a failure must not leave the previous run's graph behind.
        self.result = None;
        let request = SearchRequest {
            algorithm,
            dataset: &self.dataset,
            score: self.score.as_ref(),
            test: self.test.as_ref(),
            knowledge,
            parameters: &parameters,
        };
        let output = self.session.search(&request)?;
        tracing::info!(
            algorithm = algorithm.id(),
            nodes = output.graph.node_count(),
            edges = output.graph.edge_count(),
            resamples = output.bootstrap_graphs.len(),
            "search finished"
        );

        Ok(&self.result.insert(output).graph)
    }

    fn check_selections(&self, algorithm: &Algorithm) -> Result<(), CausewayError> {
        let requirement = algorithm.requirement();
        if requirement != Requirement::Neither && self.state() == SearchState::Unconfigured {
            return Err(CausewayError::NotConfigured);
        }
        let missing = match requirement {
            Requirement::Score if self.score.is_none() => Some("score"),
            Requirement::Test if self.test.is_none() => Some("test"),
            Requirement::Both if self.score.is_none() => Some("score"),
            Requirement::Both if self.test.is_none() => Some("test"),
            _ => None,
        };
        match missing {
            Some(needs) => Err(CausewayError::MissingSelection {
                algorithm: algorithm.id(),
                needs,
            }),
            None => Ok(()),
        }
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn dataset(&self) -> &TypedDataset {
        &self.dataset
    }

    #[must_use]
    pub fn score(&self) -> Option<&ScoreSelection> {
        self.score.as_ref()
    }

    #[must_use]
    pub fn test(&self) -> Option<&TestSelection> {
        self.test.as_ref()
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[must_use]
    pub fn bootstrap(&self) -> &Bootstrap {
        &self.bootstrap
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.parameters.bool(names::VERBOSE).unwrap_or(false)
    }

    /// Graph from the last run.
    #[must_use]
    pub fn graph(&self) -> Option<&CausalGraph> {
        self.result.as_ref().map(|r| &r.graph)
    }

    /// Per-resample graphs from the last run.
    #[must_use]
    pub fn bootstrap_graphs(&self) -> &[CausalGraph] {
        self.result
            .as_ref()
            .map_or(&[][..], |r| r.bootstrap_graphs.as_slice())
    }

    /// One per-resample graph, 0-indexed.
    pub fn bootstrap_graph(&self, index: usize) -> Result<&CausalGraph, CausewayError> {
        let graphs = self.bootstrap_graphs();
        graphs.get(index).ok_or(CausewayError::IndexOutOfRange {
            entity: "bootstrap graphs",
            index,
            len: graphs.len(),
        })
    }

    fn result_graph(&self) -> Result<&CausalGraph, CausewayError> {
        self.graph().ok_or(CausewayError::NoResult)
    }

    /// Result as an endpoint matrix, using the session's code table.
    pub fn result_matrix(&self) -> Result<EndpointMatrix, CausewayError> {
        graph_to_matrix(self.result_graph()?, &self.session.config().endpoint_codes)
    }

    /// Result as the alternate graph.
    pub fn result_alt_graph(&self) -> Result<GeneralGraph, CausewayError> {
        graph_to_general(self.result_graph()?)
    }

    /// Result as Graphviz DOT.
    pub fn result_dot(&self) -> Result<String, CausewayError> {
        dot::write_dot(self.result_graph()?)
    }

    /// A per-resample graph as Graphviz DOT.
    pub fn bootstrap_dot(&self, index: usize) -> Result<String, CausewayError> {
        dot::write_dot(self.bootstrap_graph(index)?)
    }

    /// Result as lavaan model syntax.
    pub fn result_lavaan(&self) -> Result<String, CausewayError> {
        lavaan::write_lavaan(self.result_graph()?)
    }

    /// Result as graph text.
    pub fn result_text(&self) -> Result<String, CausewayError> {
        Ok(text::write_graph(self.result_graph()?))
    }

    /// Result as graph XML.
    pub fn result_xml(&self) -> Result<String, CausewayError> {
        Ok(xml::write_xml(self.result_graph()?))
    }
}
