//! # Algorithm Catalogue
//!
//! The search algorithms the engine offers, with their options and the
//! engine's documented defaults.
//!
//! Each algorithm declares which selections it needs (`Requirement`) and
//! how it treats background knowledge (`KnowledgeUse`).

use super::parameters::{Parameters, names};
use super::{check_at_least, check_non_negative, check_positive};
use crate::CausewayError;
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUIREMENTS
// =============================================================================

/// Selections an algorithm needs before it can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Score,
    Test,
    Both,
    /// Runs on the data alone.
    Neither,
}

/// How an algorithm treats background knowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnowledgeUse {
    /// Knowledge is passed to the engine.
    Used,
    /// Knowledge is not passed; a non-empty set is logged and skipped.
    Ignored,
    /// A non-empty knowledge set is an error.
    Rejected,
}

// =============================================================================
// SHARED OPTION BLOCKS
// =============================================================================

/// PC-family options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PcOptions {
    pub conflict_rule: i64,
    pub depth: i64,
    pub use_heuristic: bool,
    pub max_path_length: i64,
    pub stable_fas: bool,
}

impl Default for PcOptions {
    fn default() -> Self {
        Self {
            conflict_rule: 1,
            depth: -1,
            use_heuristic: true,
            max_path_length: -1,
            stable_fas: true,
        }
    }
}

/// FCI options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FciOptions {
    pub fas_heuristic: i64,
    pub depth: i64,
    pub stable_fas: bool,
    pub max_path_length: i64,
    pub possible_dsep: bool,
    pub do_discriminating_path_rule: bool,
    pub complete_rule_set_used: bool,
}

impl Default for FciOptions {
    fn default() -> Self {
        Self {
            fas_heuristic: 1,
            depth: -1,
            stable_fas: true,
            max_path_length: -1,
            possible_dsep: true,
            do_discriminating_path_rule: true,
            complete_rule_set_used: true,
        }
    }
}

/// GRaSP options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraspOptions {
    pub covered_depth: i64,
    pub singular_depth: i64,
    pub nonsingular_depth: i64,
    pub ordered_alg: bool,
    pub raskutti_uhler: bool,
    pub use_data_order: bool,
    pub num_starts: i64,
}

impl Default for GraspOptions {
    fn default() -> Self {
        Self {
            covered_depth: 4,
            singular_depth: 1,
            nonsingular_depth: 1,
            ordered_alg: false,
            raskutti_uhler: false,
            use_data_order: true,
            num_starts: 1,
        }
    }
}

/// ICA-LiNGAM / ICA-LiNG-D options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IcaOptions {
    pub ica_a: f64,
    pub max_iter: i64,
    pub tolerance: f64,
    pub threshold_b: f64,
    pub threshold_spine: f64,
}

impl Default for IcaOptions {
    fn default() -> Self {
        Self {
            ica_a: 1.1,
            max_iter: 5000,
            tolerance: 1e-8,
            threshold_b: 0.1,
            threshold_spine: 0.6,
        }
    }
}

impl PcOptions {
    fn validate(&self) -> Result<(), CausewayError> {
        check_at_least(names::CONFLICT_RULE, self.conflict_rule, 1)?;
        check_at_least(names::DEPTH, self.depth, -1)?;
        check_at_least(
            names::MAX_P_ORIENTATION_MAX_PATH_LENGTH,
            self.max_path_length,
            -1,
        )
    }

    fn apply(&self, params: &mut Parameters) {
        params.set(names::CONFLICT_RULE, self.conflict_rule);
        params.set(names::DEPTH, self.depth);
        params.set(names::USE_MAX_P_ORIENTATION_HEURISTIC, self.use_heuristic);
        params.set(
            names::MAX_P_ORIENTATION_MAX_PATH_LENGTH,
            self.max_path_length,
        );
        params.set(names::STABLE_FAS, self.stable_fas);
    }
}

impl FciOptions {
    fn validate(&self) -> Result<(), CausewayError> {
        check_at_least(names::FAS_HEURISTIC, self.fas_heuristic, 1)?;
        check_at_least(names::DEPTH, self.depth, -1)?;
        check_at_least(names::MAX_PATH_LENGTH, self.max_path_length, -1)
    }

    fn apply(&self, params: &mut Parameters) {
        params.set(names::DEPTH, self.depth);
        params.set(names::FAS_HEURISTIC, self.fas_heuristic);
        params.set(names::STABLE_FAS, self.stable_fas);
        params.set(names::MAX_PATH_LENGTH, self.max_path_length);
        params.set(names::POSSIBLE_DSEP_DONE, self.possible_dsep);
        params.set(
            names::DO_DISCRIMINATING_PATH_RULE,
            self.do_discriminating_path_rule,
        );
        params.set(names::COMPLETE_RULE_SET_USED, self.complete_rule_set_used);
    }
}

impl GraspOptions {
    fn validate(&self) -> Result<(), CausewayError> {
        check_at_least(names::GRASP_DEPTH, self.covered_depth, 0)?;
        check_at_least(names::GRASP_SINGULAR_DEPTH, self.singular_depth, 0)?;
        check_at_least(names::GRASP_NONSINGULAR_DEPTH, self.nonsingular_depth, 0)?;
        check_at_least(names::NUM_STARTS, self.num_starts, 1)
    }

    fn apply(&self, params: &mut Parameters) {
        params.set(names::GRASP_DEPTH, self.covered_depth);
        params.set(names::GRASP_SINGULAR_DEPTH, self.singular_depth);
        params.set(names::GRASP_NONSINGULAR_DEPTH, self.nonsingular_depth);
        params.set(names::GRASP_ORDERED_ALG, self.ordered_alg);
        params.set(names::GRASP_USE_RASKUTTI_UHLER, self.raskutti_uhler);
        params.set(names::GRASP_USE_DATA_ORDER, self.use_data_order);
        params.set(names::NUM_STARTS, self.num_starts);
    }
}

impl IcaOptions {
    fn validate(&self) -> Result<(), CausewayError> {
        check_positive(names::FAST_ICA_A, self.ica_a)?;
        check_at_least(names::FAST_ICA_MAX_ITER, self.max_iter, 1)?;
        check_positive(names::FAST_ICA_TOLERANCE, self.tolerance)?;
        check_non_negative(names::THRESHOLD_B, self.threshold_b)?;
        check_non_negative(names::THRESHOLD_SPINE, self.threshold_spine)
    }

    fn apply(&self, params: &mut Parameters) {
        params.set(names::FAST_ICA_A, self.ica_a);
        params.set(names::FAST_ICA_MAX_ITER, self.max_iter);
        params.set(names::FAST_ICA_TOLERANCE, self.tolerance);
        params.set(names::THRESHOLD_B, self.threshold_b);
        params.set(names::THRESHOLD_SPINE, self.threshold_spine);
    }
}

/// Pairwise orientation rule GANGO applies to the FGES pattern.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkewRule {
    #[default]
    RSkew,
    Skew,
    Tanh,
}

impl SkewRule {
    /// Engine name of the rule.
    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Self::RSkew => "RSkew",
            Self::Skew => "Skew",
            Self::Tanh => "Tanh",
        }
    }
}

// =============================================================================
// ALGORITHM
// =============================================================================

/// A search algorithm with its options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "kebab-case")]
pub enum Algorithm {
    Fges {
        symmetric_first_step: bool,
        max_degree: i64,
        parallelized: bool,
        faithfulness_assumed: bool,
        meek_verbose: bool,
    },
    Boss {
        num_starts: i64,
        depth: i64,
    },
    Sp,
    Grasp(GraspOptions),
    Pc(PcOptions),
    Cpc(PcOptions),
    PcMax(PcOptions),
    Fci(FciOptions),
    Gfci {
        depth: i64,
        max_degree: i64,
        max_path_length: i64,
        complete_rule_set_used: bool,
        do_discriminating_path_rule: bool,
        possible_dsep_done: bool,
    },
    Bfci {
        depth: i64,
        max_path_length: i64,
        complete_rule_set_used: bool,
        do_discriminating_path_rule: bool,
    },
    GraspFci {
        grasp: GraspOptions,
        fci: FciOptions,
    },
    SpFci {
        depth: i64,
        max_path_length: i64,
        complete_rule_set_used: bool,
        do_discriminating_path_rule: bool,
    },
    IcaLingam(IcaOptions),
    IcaLingD(IcaOptions),
    Ccd {
        depth: i64,
        apply_r1: bool,
    },
    /// Structural VAR FCI over lagged copies of the data. Without a lag
    /// count the search's time lag is used.
    SvarFci {
        num_lags: Option<i64>,
    },
    SvarGfci {
        num_lags: Option<i64>,
    },
    /// FGES followed by pairwise orientation.
    Gango {
        max_degree: i64,
        rule: SkewRule,
    },
}

impl Algorithm {
    #[must_use]
    pub fn fges() -> Self {
        Self::Fges {
            symmetric_first_step: false,
            max_degree: -1,
            parallelized: false,
            faithfulness_assumed: false,
            meek_verbose: false,
        }
    }

    #[must_use]
    pub fn boss() -> Self {
        Self::Boss {
            num_starts: 1,
            depth: -1,
        }
    }

    #[must_use]
    pub fn gfci() -> Self {
        Self::Gfci {
            depth: -1,
            max_degree: -1,
            max_path_length: -1,
            complete_rule_set_used: true,
            do_discriminating_path_rule: true,
            possible_dsep_done: true,
        }
    }

    #[must_use]
    pub fn bfci() -> Self {
        Self::Bfci {
            depth: -1,
            max_path_length: -1,
            complete_rule_set_used: true,
            do_discriminating_path_rule: true,
        }
    }

    #[must_use]
    pub fn grasp_fci() -> Self {
        Self::GraspFci {
            grasp: GraspOptions::default(),
            fci: FciOptions::default(),
        }
    }

    #[must_use]
    pub fn sp_fci() -> Self {
        Self::SpFci {
            depth: -1,
            max_path_length: -1,
            complete_rule_set_used: true,
            do_discriminating_path_rule: true,
        }
    }

    #[must_use]
    pub fn ccd() -> Self {
        Self::Ccd {
            depth: -1,
            apply_r1: true,
        }
    }

    #[must_use]
    pub fn svar_fci() -> Self {
        Self::SvarFci { num_lags: Some(2) }
    }

    #[must_use]
    pub fn svar_gfci() -> Self {
        Self::SvarGfci { num_lags: Some(2) }
    }

    #[must_use]
    pub fn gango() -> Self {
        Self::Gango {
            max_degree: -1,
            rule: SkewRule::RSkew,
        }
    }

    /// Engine name of the algorithm.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Fges { .. } => "fges",
            Self::Boss { .. } => "boss",
            Self::Sp => "sp",
            Self::Grasp(_) => "grasp",
            Self::Pc(_) => "pc",
            Self::Cpc(_) => "cpc",
            Self::PcMax(_) => "pc-max",
            Self::Fci(_) => "fci",
            Self::Gfci { .. } => "gfci",
            Self::Bfci { .. } => "bfci",
            Self::GraspFci { .. } => "grasp-fci",
            Self::SpFci { .. } => "sp-fci",
            Self::IcaLingam(_) => "ica-lingam",
            Self::IcaLingD(_) => "ica-ling-d",
            Self::Ccd { .. } => "ccd",
            Self::SvarFci { .. } => "svar-fci",
            Self::SvarGfci { .. } => "svar-gfci",
            Self::Gango { .. } => "gango",
        }
    }

    /// Selections this algorithm needs.
    #[must_use]
    pub fn requirement(&self) -> Requirement {
        match self {
            Self::Fges { .. }
            | Self::Boss { .. }
            | Self::Sp
            | Self::Grasp(_)
            | Self::Gango { .. } => Requirement::Score,
            Self::Pc(_)
            | Self::Cpc(_)
            | Self::PcMax(_)
            | Self::Fci(_)
            | Self::Ccd { .. }
            | Self::SvarFci { .. } => Requirement::Test,
            Self::Gfci { .. }
            | Self::Bfci { .. }
            | Self::GraspFci { .. }
            | Self::SpFci { .. }
            | Self::SvarGfci { .. } => Requirement::Both,
            Self::IcaLingam(_) | Self::IcaLingD(_) => Requirement::Neither,
        }
    }

    /// How this algorithm treats background knowledge.
    #[must_use]
    pub fn knowledge_use(&self) -> KnowledgeUse {
        match self {
            Self::Ccd { .. } => KnowledgeUse::Rejected,
            // Lagged runs carry the engine's own temporal tiers.
            Self::IcaLingam(_)
            | Self::IcaLingD(_)
            | Self::SvarFci { .. }
            | Self::SvarGfci { .. } => KnowledgeUse::Ignored,
            _ => KnowledgeUse::Used,
        }
    }

    /// True for algorithms that search over lagged copies of the data and
    /// so need a time lag of at least one.
    #[must_use]
    pub fn is_lagged(&self) -> bool {
        matches!(self, Self::SvarFci { .. } | Self::SvarGfci { .. })
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<(), CausewayError> {
        match self {
            Self::Fges { max_degree, .. } => check_at_least(names::MAX_DEGREE, *max_degree, -1),
            Self::Boss { num_starts, depth } => {
                check_at_least(names::NUM_STARTS, *num_starts, 1)?;
                check_at_least(names::DEPTH, *depth, -1)
            }
            Self::Sp => Ok(()),
            Self::Grasp(grasp) => grasp.validate(),
            Self::Pc(pc) | Self::Cpc(pc) | Self::PcMax(pc) => pc.validate(),
            Self::Fci(fci) => fci.validate(),
            Self::Gfci {
                depth,
                max_degree,
                max_path_length,
                ..
            } => {
                check_at_least(names::DEPTH, *depth, -1)?;
                check_at_least(names::MAX_DEGREE, *max_degree, -1)?;
                check_at_least(names::MAX_PATH_LENGTH, *max_path_length, -1)
            }
            Self::Bfci {
                depth,
                max_path_length,
                ..
            }
            | Self::SpFci {
                depth,
                max_path_length,
                ..
            } => {
                check_at_least(names::DEPTH, *depth, -1)?;
                check_at_least(names::MAX_PATH_LENGTH, *max_path_length, -1)
            }
            Self::GraspFci { grasp, fci } => {
                grasp.validate()?;
                fci.validate()
            }
            Self::IcaLingam(ica) | Self::IcaLingD(ica) => ica.validate(),
            Self::Ccd { depth, .. } => check_at_least(names::DEPTH, *depth, -1),
            Self::SvarFci { num_lags } | Self::SvarGfci { num_lags } => match num_lags {
                Some(lags) => check_at_least(names::TIME_LAG, *lags, 1),
                None => Ok(()),
            },
            Self::Gango { max_degree, .. } => check_at_least(names::MAX_DEGREE, *max_degree, -1),
        }
    }

    /// Write the options into `params`.
    pub fn apply(&self, params: &mut Parameters) {
        match self {
            Self::Fges {
                symmetric_first_step,
                max_degree,
                parallelized,
                faithfulness_assumed,
                meek_verbose,
            } => {
                params.set(names::SYMMETRIC_FIRST_STEP, *symmetric_first_step);
                params.set(names::MAX_DEGREE, *max_degree);
                params.set(names::PARALLELIZED, *parallelized);
                params.set(names::FAITHFULNESS_ASSUMED, *faithfulness_assumed);
                params.set(names::MEEK_VERBOSE, *meek_verbose);
            }
            Self::Boss { num_starts, depth } => {
                params.set(names::NUM_STARTS, *num_starts);
                params.set(names::DEPTH, *depth);
            }
            Self::Sp => {}
            Self::Grasp(grasp) => grasp.apply(params),
            Self::Pc(pc) | Self::Cpc(pc) | Self::PcMax(pc) => pc.apply(params),
            Self::Fci(fci) => fci.apply(params),
            Self::Gfci {
                depth,
                max_degree,
                max_path_length,
                complete_rule_set_used,
                do_discriminating_path_rule,
                possible_dsep_done,
            } => {
                params.set(names::DEPTH, *depth);
                params.set(names::MAX_DEGREE, *max_degree);
                params.set(names::MAX_PATH_LENGTH, *max_path_length);
                params.set(names::COMPLETE_RULE_SET_USED, *complete_rule_set_used);
                params.set(
                    names::DO_DISCRIMINATING_PATH_RULE,
                    *do_discriminating_path_rule,
                );
                params.set(names::POSSIBLE_DSEP_DONE, *possible_dsep_done);
            }
            Self::Bfci {
                depth,
                max_path_length,
                complete_rule_set_used,
                do_discriminating_path_rule,
            }
            | Self::SpFci {
                depth,
                max_path_length,
                complete_rule_set_used,
                do_discriminating_path_rule,
            } => {
                params.set(names::DEPTH, *depth);
                params.set(names::MAX_PATH_LENGTH, *max_path_length);
                params.set(names::COMPLETE_RULE_SET_USED, *complete_rule_set_used);
                params.set(
                    names::DO_DISCRIMINATING_PATH_RULE,
                    *do_discriminating_path_rule,
                );
            }
            Self::GraspFci { grasp, fci } => {
                grasp.apply(params);
                fci.apply(params);
            }
            Self::IcaLingam(ica) | Self::IcaLingD(ica) => ica.apply(params),
            Self::Ccd { depth, apply_r1 } => {
                params.set(names::DEPTH, *depth);
                params.set(names::APPLY_R1, *apply_r1);
            }
            Self::SvarFci { num_lags } | Self::SvarGfci { num_lags } => {
                if let Some(lags) = num_lags {
                    params.set(names::TIME_LAG, *lags);
                }
            }
            Self::Gango { max_degree, rule } => {
                params.set(names::MAX_DEGREE, *max_degree);
                params.set(names::LOFS_RULE, rule.id());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue() -> Vec<Algorithm> {
        vec![
            Algorithm::fges(),
            Algorithm::boss(),
            Algorithm::Sp,
            Algorithm::Grasp(GraspOptions::default()),
            Algorithm::Pc(PcOptions::default()),
            Algorithm::Cpc(PcOptions::default()),
            Algorithm::PcMax(PcOptions::default()),
            Algorithm::Fci(FciOptions::default()),
            Algorithm::gfci(),
            Algorithm::bfci(),
            Algorithm::grasp_fci(),
            Algorithm::sp_fci(),
            Algorithm::IcaLingam(IcaOptions::default()),
            Algorithm::IcaLingD(IcaOptions::default()),
            Algorithm::ccd(),
            Algorithm::svar_fci(),
            Algorithm::svar_gfci(),
            Algorithm::gango(),
        ]
    }

    #[test]
    fn defaults_are_valid_and_ids_unique() {
        let algorithms = catalogue();
        for algorithm in &algorithms {
            assert!(algorithm.validate().is_ok(), "{}", algorithm.id());
        }
        let mut ids: Vec<_> = algorithms.iter().map(Algorithm::id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), algorithms.len());
    }

    #[test]
    fn requirements_follow_algorithm_family() {
        assert_eq!(Algorithm::fges().requirement(), Requirement::Score);
        assert_eq!(
            Algorithm::Pc(PcOptions::default()).requirement(),
            Requirement::Test
        );
        assert_eq!(Algorithm::gfci().requirement(), Requirement::Both);
        assert_eq!(
            Algorithm::IcaLingam(IcaOptions::default()).requirement(),
            Requirement::Neither
        );
        assert_eq!(Algorithm::ccd().knowledge_use(), KnowledgeUse::Rejected);
        assert_eq!(Algorithm::boss().knowledge_use(), KnowledgeUse::Used);
    }

    #[test]
    fn grasp_fci_writes_both_option_blocks() {
        let mut params = Parameters::new();
        Algorithm::grasp_fci().apply(&mut params);
        assert_eq!(params.int(names::GRASP_DEPTH), Some(4));
        assert_eq!(params.bool(names::POSSIBLE_DSEP_DONE), Some(true));
        assert_eq!(params.int(names::DEPTH), Some(-1));
    }

    #[test]
    fn invalid_options_are_rejected() {
        let algorithm = Algorithm::Boss {
            num_starts: 0,
            depth: -1,
        };
        assert!(matches!(
            algorithm.validate(),
            Err(CausewayError::InvalidParameter { ref name, .. }) if name == "numStarts"
        ));
        let ica = Algorithm::IcaLingam(IcaOptions {
            tolerance: 0.0,
            ..IcaOptions::default()
        });
        assert!(ica.validate().is_err());
    }

    #[test]
    fn options_deserialize_with_defaults() {
        let algorithm: Algorithm =
            serde_json::from_str(r#"{"algorithm":"pc","depth":3}"#).expect("json");
        assert_eq!(
            algorithm,
            Algorithm::Pc(PcOptions {
                depth: 3,
                ..PcOptions::default()
            })
        );
    }

    #[test]
    fn time_series_algorithms_write_their_lag() {
        let mut params = Parameters::new();
        params.set(names::TIME_LAG, 5_i64);
        Algorithm::SvarFci { num_lags: None }.apply(&mut params);
        assert_eq!(params.int(names::TIME_LAG), Some(5));

        Algorithm::svar_gfci().apply(&mut params);
        assert_eq!(params.int(names::TIME_LAG), Some(2));

        assert_eq!(Algorithm::svar_fci().requirement(), Requirement::Test);
        assert_eq!(Algorithm::svar_gfci().requirement(), Requirement::Both);
        assert_eq!(Algorithm::svar_fci().knowledge_use(), KnowledgeUse::Ignored);
        assert!(Algorithm::SvarFci { num_lags: Some(0) }.validate().is_err());
    }

    #[test]
    fn gango_passes_its_rule_as_text() {
        let mut params = Parameters::new();
        Algorithm::Gango {
            max_degree: 3,
            rule: SkewRule::Tanh,
        }
        .apply(&mut params);
        assert_eq!(params.text(names::LOFS_RULE), Some("Tanh"));
        assert_eq!(params.int(names::MAX_DEGREE), Some(3));
        assert_eq!(Algorithm::gango().requirement(), Requirement::Score);

        let parsed: Algorithm =
            serde_json::from_str(r#"{"algorithm":"gango","max_degree":-1,"rule":"r-skew"}"#)
                .expect("json");
        assert_eq!(parsed, Algorithm::gango());
    }
}
