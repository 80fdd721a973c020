//! # Parameters
//!
//! The flat hyperparameter map handed to the engine, keyed by the engine's
//! own parameter names (see `names`).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Engine parameter names.
pub mod names {
    // Scores
    pub const PENALTY_DISCOUNT: &str = "penaltyDiscount";
    pub const PENALTY_DISCOUNT_ZS: &str = "penaltyDiscountZs";
    pub const SEM_BIC_STRUCTURE_PRIOR: &str = "semBicStructurePrior";
    pub const SEM_BIC_RULE: &str = "semBicRule";
    pub const SEM_GIC_RULE: &str = "semGicRule";
    pub const STRUCTURE_PRIOR: &str = "structurePrior";
    pub const PRECOMPUTE_COVARIANCES: &str = "precomputeCovariances";
    pub const F_DEGREE: &str = "fDegree";
    pub const DISCRETIZE: &str = "discretize";
    pub const NUM_CATEGORIES_TO_DISCRETIZE: &str = "numCategoriesToDiscretize";
    pub const POISSON_LAMBDA: &str = "poissonLambda";
    pub const ZS_RISK_BOUND: &str = "zSRiskBound";
    pub const PRIOR_EQUIVALENT_SAMPLE_SIZE: &str = "priorEquivalentSampleSize";

    // Tests
    pub const ALPHA: &str = "alpha";
    pub const NO_RANDOMLY_DETERMINED_INDEPENDENCE: &str = "noRandomlyDeterminedIndependence";
    pub const CUTOFF_IND_TEST: &str = "cutoffIndTest";
    pub const KCI_USE_APPROXIMATION: &str = "kciUseApproximation";
    pub const KERNEL_MULTIPLIER: &str = "kernelMultiplier";
    pub const KCI_NUM_BOOTSTRAPS: &str = "kciNumBootstraps";
    pub const THRESHOLD_FOR_NUM_EIGENVALUES: &str = "thresholdForNumEigenvalues";
    pub const KCI_EPSILON: &str = "kciEpsilon";

    // Algorithms
    pub const SYMMETRIC_FIRST_STEP: &str = "symmetricFirstStep";
    pub const MAX_DEGREE: &str = "maxDegree";
    pub const PARALLELIZED: &str = "parallelized";
    pub const FAITHFULNESS_ASSUMED: &str = "faithfulnessAssumed";
    pub const MEEK_VERBOSE: &str = "meekVerbose";
    pub const NUM_STARTS: &str = "numStarts";
    pub const DEPTH: &str = "depth";
    pub const GRASP_DEPTH: &str = "graspDepth";
    pub const GRASP_SINGULAR_DEPTH: &str = "graspSingularDepth";
    pub const GRASP_NONSINGULAR_DEPTH: &str = "graspNonSingularDepth";
    pub const GRASP_ORDERED_ALG: &str = "graspOrderedAlg";
    pub const GRASP_USE_RASKUTTI_UHLER: &str = "graspUseRaskuttiUhler";
    pub const GRASP_USE_DATA_ORDER: &str = "graspUseDataOrder";
    pub const CONFLICT_RULE: &str = "conflictRule";
    pub const USE_MAX_P_ORIENTATION_HEURISTIC: &str = "useMaxPOrientationHeuristic";
    pub const MAX_P_ORIENTATION_MAX_PATH_LENGTH: &str = "maxPOrientationMaxPathLength";
    pub const STABLE_FAS: &str = "stableFAS";
    pub const FAS_HEURISTIC: &str = "fasHeuristic";
    pub const MAX_PATH_LENGTH: &str = "maxPathLength";
    pub const POSSIBLE_DSEP_DONE: &str = "possibleDsepDone";
    pub const DO_DISCRIMINATING_PATH_RULE: &str = "doDiscriminatingPathRule";
    pub const COMPLETE_RULE_SET_USED: &str = "completeRuleSetUsed";
    pub const FAST_ICA_A: &str = "fastIcaA";
    pub const FAST_ICA_MAX_ITER: &str = "fastIcaMaxIter";
    pub const FAST_ICA_TOLERANCE: &str = "fastIcaTolerance";
    pub const THRESHOLD_B: &str = "thresholdB";
    pub const THRESHOLD_SPINE: &str = "thresholdSpine";
    pub const APPLY_R1: &str = "applyR1";
    pub const LOFS_RULE: &str = "lofsRule";

    // Bootstrapping
    pub const NUMBER_RESAMPLING: &str = "numberResampling";
    pub const PERCENT_RESAMPLE_SIZE: &str = "percentResampleSize";
    pub const ADD_ORIGINAL_DATASET: &str = "addOriginalDataset";
    pub const RESAMPLING_WITH_REPLACEMENT: &str = "resamplingWithReplacement";
    pub const RESAMPLING_ENSEMBLE: &str = "resamplingEnsemble";
    pub const SEED: &str = "seed";

    // Run flags
    pub const VERBOSE: &str = "verbose";
    pub const TIME_LAG: &str = "timeLag";
}

// =============================================================================
// PARAM VALUE
// =============================================================================

/// One hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for ParamValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

// =============================================================================
// PARAMETERS
// =============================================================================

/// Ordered hyperparameter map. Later writes replace earlier ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Parameters {
    values: BTreeMap<String, ParamValue>,
}

impl Parameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a parameter.
    pub fn set(&mut self, name: &str, value: impl Into<ParamValue>) {
        self.values.insert(name.to_string(), value.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Integer value, if present and integral.
    #[must_use]
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float value; integers are widened.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Parameters in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters() {
        let mut params = Parameters::new();
        params.set(names::ALPHA, 0.05);
        params.set(names::DEPTH, -1_i64);
        params.set(names::VERBOSE, true);
        params.set(names::LOFS_RULE, "RSkew");

        assert_eq!(params.float(names::ALPHA), Some(0.05));
        assert_eq!(params.float(names::DEPTH), Some(-1.0));
        assert_eq!(params.int(names::ALPHA), None);
        assert_eq!(params.bool(names::VERBOSE), Some(true));
        assert_eq!(params.text(names::LOFS_RULE), Some("RSkew"));
        assert_eq!(params.bool(names::LOFS_RULE), None);
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn later_writes_replace() {
        let mut params = Parameters::new();
        params.set(names::PENALTY_DISCOUNT, 2.0);
        params.set(names::PENALTY_DISCOUNT, 1.0);
        assert_eq!(params.float(names::PENALTY_DISCOUNT), Some(1.0));
        assert_eq!(params.iter().count(), 1);
    }
}
