//! # Score and Test Selections
//!
//! The scores and conditional-independence tests a search can be
//! configured with. Each selection validates its hyperparameters and
//! writes them into `Parameters` under the engine's names.
//!
//! Constructors (`ScoreSelection::sem_bic()`, `TestSelection::fisher_z()`,
//! ...) return the engine's documented defaults.

use super::parameters::{Parameters, names};
use super::{check_at_least, check_non_negative, check_positive, check_unit_interval};
use crate::CausewayError;
use serde::{Deserialize, Serialize};

// =============================================================================
// SCORES
// =============================================================================

/// A scoring function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "score", rename_all = "kebab-case")]
pub enum ScoreSelection {
    SemBic {
        penalty_discount: f64,
        structure_prior: f64,
        rule: i64,
    },
    Ebic {
        gamma: f64,
        precompute_covariances: bool,
    },
    KimEtAl {
        penalty_discount: f64,
        sem_gic_rule: i64,
    },
    MixedVariablePolynomial {
        structure_prior: f64,
        f_degree: i64,
        discretize: bool,
    },
    PoissonPrior {
        lambda: f64,
        precompute_covariances: bool,
    },
    ZhangShenBound {
        risk_bound: f64,
    },
    Bdeu {
        sample_prior: f64,
        structure_prior: f64,
    },
    ConditionalGaussian {
        penalty_discount: f64,
        discretize: bool,
        num_categories_to_discretize: i64,
        structure_prior: f64,
    },
    DegenerateGaussian {
        penalty_discount: f64,
        structure_prior: f64,
    },
}

impl ScoreSelection {
    #[must_use]
    pub fn sem_bic() -> Self {
        Self::SemBic {
            penalty_discount: 2.0,
            structure_prior: 0.0,
            rule: 1,
        }
    }

    #[must_use]
    pub fn ebic() -> Self {
        Self::Ebic {
            gamma: 0.8,
            precompute_covariances: true,
        }
    }

    #[must_use]
    pub fn kim_et_al() -> Self {
        Self::KimEtAl {
            penalty_discount: 1.0,
            sem_gic_rule: 4,
        }
    }

    #[must_use]
    pub fn mixed_variable_polynomial() -> Self {
        Self::MixedVariablePolynomial {
            structure_prior: 0.0,
            f_degree: 0,
            discretize: false,
        }
    }

    #[must_use]
    pub fn poisson_prior() -> Self {
        Self::PoissonPrior {
            lambda: 2.0,
            precompute_covariances: true,
        }
    }

    #[must_use]
    pub fn zhang_shen_bound() -> Self {
        Self::ZhangShenBound { risk_bound: 0.2 }
    }

    #[must_use]
    pub fn bdeu() -> Self {
        Self::Bdeu {
            sample_prior: 10.0,
            structure_prior: 0.0,
        }
    }

    #[must_use]
    pub fn conditional_gaussian() -> Self {
        Self::ConditionalGaussian {
            penalty_discount: 1.0,
            discretize: true,
            num_categories_to_discretize: 3,
            structure_prior: 0.0,
        }
    }

    #[must_use]
    pub fn degenerate_gaussian() -> Self {
        Self::DegenerateGaussian {
            penalty_discount: 1.0,
            structure_prior: 0.0,
        }
    }

    /// Engine class name of the score.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::SemBic { .. } => "SemBicScore",
            Self::Ebic { .. } => "EbicScore",
            Self::KimEtAl { .. } => "KimEtAlScores",
            Self::MixedVariablePolynomial { .. } => "MVPBicScore",
            Self::PoissonPrior { .. } => "PoissonPriorScore",
            Self::ZhangShenBound { .. } => "ZhangShenBoundScore",
            Self::Bdeu { .. } => "BdeuScore",
            Self::ConditionalGaussian { .. } => "ConditionalGaussianBicScore",
            Self::DegenerateGaussian { .. } => "DegenerateGaussianBicScore",
        }
    }

    /// Check hyperparameter ranges.
    pub fn validate(&self) -> Result<(), CausewayError> {
        match self {
            Self::SemBic {
                penalty_discount,
                structure_prior,
                rule,
            } => {
                check_positive(names::PENALTY_DISCOUNT, *penalty_discount)?;
                check_non_negative(names::SEM_BIC_STRUCTURE_PRIOR, *structure_prior)?;
                check_at_least(names::SEM_BIC_RULE, *rule, 1)
            }
            Self::Ebic { gamma, .. } => check_non_negative(names::PENALTY_DISCOUNT, *gamma),
            Self::KimEtAl {
                penalty_discount,
                sem_gic_rule,
            } => {
                check_positive(names::PENALTY_DISCOUNT_ZS, *penalty_discount)?;
                check_at_least(names::SEM_GIC_RULE, *sem_gic_rule, 1)
            }
            Self::MixedVariablePolynomial {
                structure_prior,
                f_degree,
                ..
            } => {
                check_non_negative(names::STRUCTURE_PRIOR, *structure_prior)?;
                check_at_least(names::F_DEGREE, *f_degree, 0)
            }
            Self::PoissonPrior { lambda, .. } => check_positive(names::POISSON_LAMBDA, *lambda),
            Self::ZhangShenBound { risk_bound } => {
                check_unit_interval(names::ZS_RISK_BOUND, *risk_bound)
            }
            Self::Bdeu {
                sample_prior,
                structure_prior,
            } => {
                check_positive(names::PRIOR_EQUIVALENT_SAMPLE_SIZE, *sample_prior)?;
                check_non_negative(names::STRUCTURE_PRIOR, *structure_prior)
            }
            Self::ConditionalGaussian {
                penalty_discount,
                num_categories_to_discretize,
                structure_prior,
                ..
            } => {
                check_positive(names::PENALTY_DISCOUNT, *penalty_discount)?;
                check_at_least(
                    names::NUM_CATEGORIES_TO_DISCRETIZE,
                    *num_categories_to_discretize,
                    2,
                )?;
                check_non_negative(names::STRUCTURE_PRIOR, *structure_prior)
            }
            Self::DegenerateGaussian {
                penalty_discount,
                structure_prior,
            } => {
                check_positive(names::PENALTY_DISCOUNT, *penalty_discount)?;
                check_non_negative(names::STRUCTURE_PRIOR, *structure_prior)
            }
        }
    }

    /// Write the hyperparameters into `params`.
    pub fn apply(&self, params: &mut Parameters) {
        match self {
            Self::SemBic {
                penalty_discount,
                structure_prior,
                rule,
            } => {
                params.set(names::PENALTY_DISCOUNT, *penalty_discount);
                params.set(names::SEM_BIC_STRUCTURE_PRIOR, *structure_prior);
                params.set(names::SEM_BIC_RULE, *rule);
            }
            Self::Ebic {
                gamma,
                precompute_covariances,
            } => {
                params.set(names::PENALTY_DISCOUNT, *gamma);
                params.set(names::PRECOMPUTE_COVARIANCES, *precompute_covariances);
            }
            Self::KimEtAl {
                penalty_discount,
                sem_gic_rule,
            } => {
                params.set(names::SEM_GIC_RULE, *sem_gic_rule);
                params.set(names::PENALTY_DISCOUNT_ZS, *penalty_discount);
            }
            Self::MixedVariablePolynomial {
                structure_prior,
                f_degree,
                discretize,
            } => {
                params.set(names::STRUCTURE_PRIOR, *structure_prior);
                params.set(names::F_DEGREE, *f_degree);
                params.set(names::DISCRETIZE, *discretize);
            }
            Self::PoissonPrior {
                lambda,
                precompute_covariances,
            } => {
                params.set(names::PRECOMPUTE_COVARIANCES, *precompute_covariances);
                params.set(names::POISSON_LAMBDA, *lambda);
            }
            Self::ZhangShenBound { risk_bound } => {
                params.set(names::ZS_RISK_BOUND, *risk_bound);
            }
            Self::Bdeu {
                sample_prior,
                structure_prior,
            } => {
                params.set(names::PRIOR_EQUIVALENT_SAMPLE_SIZE, *sample_prior);
                params.set(names::STRUCTURE_PRIOR, *structure_prior);
            }
            Self::ConditionalGaussian {
                penalty_discount,
                discretize,
                num_categories_to_discretize,
                structure_prior,
            } => {
                params.set(names::PENALTY_DISCOUNT, *penalty_discount);
                params.set(names::STRUCTURE_PRIOR, *structure_prior);
                params.set(names::DISCRETIZE, *discretize);
                params.set(
                    names::NUM_CATEGORIES_TO_DISCRETIZE,
                    *num_categories_to_discretize,
                );
            }
            Self::DegenerateGaussian {
                penalty_discount,
                structure_prior,
            } => {
                params.set(names::PENALTY_DISCOUNT, *penalty_discount);
                params.set(names::STRUCTURE_PRIOR, *structure_prior);
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

/// A conditional-independence test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "test", rename_all = "kebab-case")]
pub enum TestSelection {
    FisherZ {
        alpha: f64,
    },
    ChiSquare {
        alpha: f64,
    },
    GSquare {
        alpha: f64,
    },
    ConditionalGaussian {
        alpha: f64,
        discretize: bool,
        num_categories_to_discretize: i64,
    },
    DegenerateGaussian {
        alpha: f64,
    },
    Probabilistic {
        threshold: bool,
        cutoff: f64,
        prior_ess: f64,
    },
    Kci {
        alpha: f64,
        approximate: bool,
        width_multiplier: f64,
        num_bootstraps: i64,
        threshold: f64,
        epsilon: f64,
    },
}

/// Default significance level of the tests.
const DEFAULT_ALPHA: f64 = 0.01;

impl TestSelection {
    #[must_use]
    pub fn fisher_z() -> Self {
        Self::FisherZ {
            alpha: DEFAULT_ALPHA,
        }
    }

    #[must_use]
    pub fn chi_square() -> Self {
        Self::ChiSquare {
            alpha: DEFAULT_ALPHA,
        }
    }

    #[must_use]
    pub fn g_square() -> Self {
        Self::GSquare {
            alpha: DEFAULT_ALPHA,
        }
    }

    #[must_use]
    pub fn conditional_gaussian() -> Self {
        Self::ConditionalGaussian {
            alpha: DEFAULT_ALPHA,
            discretize: true,
            num_categories_to_discretize: 3,
        }
    }

    #[must_use]
    pub fn degenerate_gaussian() -> Self {
        Self::DegenerateGaussian {
            alpha: DEFAULT_ALPHA,
        }
    }

    #[must_use]
    pub fn probabilistic() -> Self {
        Self::Probabilistic {
            threshold: false,
            cutoff: 0.5,
            prior_ess: 10.0,
        }
    }

    #[must_use]
    pub fn kci() -> Self {
        Self::Kci {
            alpha: DEFAULT_ALPHA,
            approximate: true,
            width_multiplier: 1.0,
            num_bootstraps: 5000,
            threshold: 0.001,
            epsilon: 0.001,
        }
    }

    /// Engine class name of the test.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::FisherZ { .. } => "FisherZ",
            Self::ChiSquare { .. } => "ChiSquare",
            Self::GSquare { .. } => "Gsquare",
            Self::ConditionalGaussian { .. } => "ConditionalGaussianLRT",
            Self::DegenerateGaussian { .. } => "DegenerateGaussianLRT",
            Self::Probabilistic { .. } => "ProbabilisticTest",
            Self::Kci { .. } => "Kci",
        }
    }

    /// Significance level, for the tests that have one.
    #[must_use]
    pub fn alpha(&self) -> Option<f64> {
        match self {
            Self::FisherZ { alpha }
            | Self::ChiSquare { alpha }
            | Self::GSquare { alpha }
            | Self::ConditionalGaussian { alpha, .. }
            | Self::DegenerateGaussian { alpha }
            | Self::Kci { alpha, .. } => Some(*alpha),
            Self::Probabilistic { .. } => None,
        }
    }

    /// Check hyperparameter ranges.
    pub fn validate(&self) -> Result<(), CausewayError> {
        if let Some(alpha) = self.alpha() {
            check_unit_interval(names::ALPHA, alpha)?;
        }
        match self {
            Self::ConditionalGaussian {
                num_categories_to_discretize,
                ..
            } => check_at_least(
                names::NUM_CATEGORIES_TO_DISCRETIZE,
                *num_categories_to_discretize,
                2,
            ),
            Self::Probabilistic {
                cutoff, prior_ess, ..
            } => {
                check_unit_interval(names::CUTOFF_IND_TEST, *cutoff)?;
                check_positive(names::PRIOR_EQUIVALENT_SAMPLE_SIZE, *prior_ess)
            }
            Self::Kci {
                width_multiplier,
                num_bootstraps,
                threshold,
                epsilon,
                ..
            } => {
                check_positive(names::KERNEL_MULTIPLIER, *width_multiplier)?;
                check_at_least(names::KCI_NUM_BOOTSTRAPS, *num_bootstraps, 1)?;
                check_positive(names::THRESHOLD_FOR_NUM_EIGENVALUES, *threshold)?;
                check_positive(names::KCI_EPSILON, *epsilon)
            }
            Self::FisherZ { .. }
            | Self::ChiSquare { .. }
            | Self::GSquare { .. }
            | Self::DegenerateGaussian { .. } => Ok(()),
        }
    }

    /// Write the hyperparameters into `params`.
    pub fn apply(&self, params: &mut Parameters) {
        if let Some(alpha) = self.alpha() {
            params.set(names::ALPHA, alpha);
        }
        match self {
            Self::ConditionalGaussian {
                discretize,
                num_categories_to_discretize,
                ..
            } => {
                params.set(names::DISCRETIZE, *discretize);
                params.set(
                    names::NUM_CATEGORIES_TO_DISCRETIZE,
                    *num_categories_to_discretize,
                );
            }
            Self::Probabilistic {
                threshold,
                cutoff,
                prior_ess,
            } => {
                params.set(names::NO_RANDOMLY_DETERMINED_INDEPENDENCE, *threshold);
                params.set(names::CUTOFF_IND_TEST, *cutoff);
                params.set(names::PRIOR_EQUIVALENT_SAMPLE_SIZE, *prior_ess);
            }
            Self::Kci {
                approximate,
                width_multiplier,
                num_bootstraps,
                threshold,
                epsilon,
                ..
            } => {
                params.set(names::KCI_USE_APPROXIMATION, *approximate);
                params.set(names::KERNEL_MULTIPLIER, *width_multiplier);
                params.set(names::KCI_NUM_BOOTSTRAPS, *num_bootstraps);
                params.set(names::THRESHOLD_FOR_NUM_EIGENVALUES, *threshold);
                params.set(names::KCI_EPSILON, *epsilon);
            }
            Self::FisherZ { .. }
            | Self::ChiSquare { .. }
            | Self::GSquare { .. }
            | Self::DegenerateGaussian { .. } => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sem_bic_defaults_reach_parameters() {
        let score = ScoreSelection::sem_bic();
        assert!(score.validate().is_ok());

        let mut params = Parameters::new();
        score.apply(&mut params);
        assert_eq!(params.float(names::PENALTY_DISCOUNT), Some(2.0));
        assert_eq!(params.int(names::SEM_BIC_RULE), Some(1));
        assert_eq!(score.id(), "SemBicScore");
    }

    #[test]
    fn every_default_selection_is_valid() {
        let scores = [
            ScoreSelection::sem_bic(),
            ScoreSelection::ebic(),
            ScoreSelection::kim_et_al(),
            ScoreSelection::mixed_variable_polynomial(),
            ScoreSelection::poisson_prior(),
            ScoreSelection::zhang_shen_bound(),
            ScoreSelection::bdeu(),
            ScoreSelection::conditional_gaussian(),
            ScoreSelection::degenerate_gaussian(),
        ];
        for score in &scores {
            assert!(score.validate().is_ok(), "{}", score.id());
        }
        let tests = [
            TestSelection::fisher_z(),
            TestSelection::chi_square(),
            TestSelection::g_square(),
            TestSelection::conditional_gaussian(),
            TestSelection::degenerate_gaussian(),
            TestSelection::probabilistic(),
            TestSelection::kci(),
        ];
        for test in &tests {
            assert!(test.validate().is_ok(), "{}", test.id());
        }
    }

    #[test]
    fn alpha_must_lie_inside_the_unit_interval() {
        for alpha in [0.0, 1.0, -0.2, f64::NAN] {
            let err = TestSelection::FisherZ { alpha }
                .validate()
                .expect_err("invalid alpha");
            assert!(matches!(err, CausewayError::InvalidParameter { ref name, .. } if name == "alpha"));
        }
    }

    #[test]
    fn penalty_must_be_positive() {
        let score = ScoreSelection::SemBic {
            penalty_discount: 0.0,
            structure_prior: 0.0,
            rule: 1,
        };
        assert!(matches!(
            score.validate(),
            Err(CausewayError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn kci_writes_all_settings() {
        let mut params = Parameters::new();
        TestSelection::kci().apply(&mut params);
        assert_eq!(params.float(names::ALPHA), Some(0.01));
        assert_eq!(params.bool(names::KCI_USE_APPROXIMATION), Some(true));
        assert_eq!(params.int(names::KCI_NUM_BOOTSTRAPS), Some(5000));
        assert_eq!(params.len(), 6);
    }

    #[test]
    fn selections_deserialize_from_tagged_json() {
        let test: TestSelection =
            serde_json::from_str(r#"{"test":"fisher-z","alpha":0.05}"#).expect("json");
        assert_eq!(test, TestSelection::FisherZ { alpha: 0.05 });

        let score: ScoreSelection = serde_json::from_str(
            r#"{"score":"sem-bic","penalty_discount":1.0,"structure_prior":0.0,"rule":1}"#,
        )
        .expect("json");
        assert_eq!(score.id(), "SemBicScore");
    }
}
