//! Bootstrap resampling settings.

use super::parameters::{Parameters, names};
use crate::CausewayError;
use crate::primitives::MAX_BOOTSTRAP_RESAMPLES;
use serde::{Deserialize, Serialize};

/// How per-resample graphs are combined into the final graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ensemble {
    Preserved,
    #[default]
    Highest,
    Majority,
}

impl Ensemble {
    /// Engine-side code.
    #[must_use]
    pub const fn code(self) -> i64 {
        match self {
            Self::Preserved => 0,
            Self::Highest => 1,
            Self::Majority => 2,
        }
    }
}

/// Bootstrap settings. Zero resamples disables bootstrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bootstrap {
    pub resamples: usize,
    /// Resample size as a percentage of the row count, `1..=100`.
    pub percent_resample_size: u8,
    pub add_original: bool,
    pub with_replacement: bool,
    pub ensemble: Ensemble,
    pub seed: Option<i64>,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            resamples: 0,
            percent_resample_size: 100,
            add_original: true,
            with_replacement: true,
            ensemble: Ensemble::default(),
            seed: None,
        }
    }
}

impl Bootstrap {
    /// Enabled bootstrap with default settings.
    #[must_use]
    pub fn with_resamples(resamples: usize) -> Self {
        Self {
            resamples,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.resamples > 0
    }

    pub fn validate(&self) -> Result<(), CausewayError> {
        if !(1..=100).contains(&self.percent_resample_size) {
            return Err(CausewayError::InvalidParameter {
                name: names::PERCENT_RESAMPLE_SIZE.to_string(),
                message: format!("must be in 1..=100, got {}", self.percent_resample_size),
            });
        }
        if self.resamples > MAX_BOOTSTRAP_RESAMPLES {
            return Err(CausewayError::InvalidParameter {
                name: names::NUMBER_RESAMPLING.to_string(),
                message: format!(
                    "must be at most {MAX_BOOTSTRAP_RESAMPLES}, got {}",
                    self.resamples
                ),
            });
        }
        Ok(())
    }

    /// Write the settings into `params`. An absent seed is written as `-1`.
    pub fn apply(&self, params: &mut Parameters) {
        params.set(names::NUMBER_RESAMPLING, self.resamples);
        params.set(
            names::PERCENT_RESAMPLE_SIZE,
            i64::from(self.percent_resample_size),
        );
        params.set(names::ADD_ORIGINAL_DATASET, self.add_original);
        params.set(names::RESAMPLING_WITH_REPLACEMENT, self.with_replacement);
        params.set(names::RESAMPLING_ENSEMBLE, self.ensemble.code());
        params.set(names::SEED, self.seed.unwrap_or(-1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_disabled() {
        let bootstrap = Bootstrap::default();
        assert!(!bootstrap.is_enabled());
        assert!(bootstrap.validate().is_ok());

        let mut params = Parameters::new();
        bootstrap.apply(&mut params);
        assert_eq!(params.int(names::NUMBER_RESAMPLING), Some(0));
        assert_eq!(params.int(names::RESAMPLING_ENSEMBLE), Some(1));
        assert_eq!(params.int(names::SEED), Some(-1));
    }

    #[test]
    fn percent_out_of_range_is_rejected() {
        for percent in [0, 101] {
            let bootstrap = Bootstrap {
                percent_resample_size: percent,
                ..Bootstrap::with_resamples(10)
            };
            assert!(matches!(
                bootstrap.validate(),
                Err(CausewayError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn resample_count_is_bounded() {
        let bootstrap = Bootstrap::with_resamples(MAX_BOOTSTRAP_RESAMPLES + 1);
        assert!(bootstrap.validate().is_err());
    }
}
