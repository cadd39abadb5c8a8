//! Model configuration.

use serde::{Deserialize, Serialize};
use tangrams_data::WordFilter;

/// Immutable configuration shared by training, scoring and evaluation.
///
/// By default the ridge penalty is strong and only words seen in at least three rounds get a
/// dedicated classifier. Scores are unweighted and the model is not updated during testing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParams {
    /// Regularize the logistic regressions with a ridge penalty.
    pub use_ridge: bool,
    /// Ridge penalty strength (used when `use_ridge` is set).
    pub ridge: f64,
    /// Minimum number of rounds a word must occur in to get its own classifier.
    pub discount: u32,
    /// Only use words spoken by the giver.
    pub only_giver: bool,
    /// Only use referring-language tokens.
    pub only_referring_language: bool,
    /// Multiply each word's score by `log10` of its vocabulary count.
    pub weight_by_freq: bool,
    /// Multiply each word's score by its discriminative power.
    pub weight_by_power: bool,
    /// Update the model with each evaluated round during testing.
    pub update_model: bool,
    /// Instance weight of rounds added by incremental updates (1.0 = background weight).
    pub update_weight: f64,
    /// Words whose count exceeded this before an update are not retrained by it.
    pub update_max_count: u32,
    /// Instance weight multiplier of target referents relative to non-targets.
    pub target_weight: f64,
}

/// Penalty used when ridge regularization is disabled; keeps the Newton steps well posed.
pub const MIN_RIDGE: f64 = 1e-8;

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            use_ridge: true,
            ridge: 100.0,
            discount: 3,
            only_giver: false,
            only_referring_language: false,
            weight_by_freq: false,
            weight_by_power: false,
            update_model: false,
            update_weight: 1.0,
            update_max_count: 200,
            target_weight: 19.0,
        }
    }
}

impl ModelParams {
    #[must_use]
    pub fn word_filter(&self) -> WordFilter {
        WordFilter {
            only_giver: self.only_giver,
            only_referring_language: self.only_referring_language,
        }
    }

    /// The ridge penalty actually applied to a fit.
    #[must_use]
    pub fn effective_ridge(&self) -> f64 {
        if self.use_ridge {
            self.ridge.max(MIN_RIDGE)
        } else {
            MIN_RIDGE
        }
    }

    /// Training weight of one referent instance.
    ///
    /// Targets are up-weighted by `target_weight` to offset the one-target-per-round class
    /// imbalance; both classes scale with the weight of the round they come from.
    #[must_use]
    pub fn instance_weight(&self, round_weight: f64, is_target: bool) -> f64 {
        if is_target {
            round_weight * self.target_weight
        } else {
            round_weight
        }
    }

    /// Tab-separated column names matching [`ModelParams::setting`].
    #[must_use]
    pub fn header() -> &'static str {
        "DISCOUNT\tONLY_REFLANG\tONLY_GIVER\tWEIGHT_BY_FREQ\tWEIGHT_BY_POWER\tUPDATE_MODEL\tUPDATE_WEIGHT"
    }

    /// Tab-separated values of the settings that distinguish experiment runs.
    #[must_use]
    pub fn setting(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.discount,
            self.only_referring_language,
            self.only_giver,
            self.weight_by_freq,
            self.weight_by_power,
            self.update_model,
            self.update_weight
        )
    }
}
