//! Rank statistics.
//!
//! | Metric     | Per round                 | Best |
//! |------------|---------------------------|------|
//! | Mean rank  | 1-based rank of target    | 1.0  |
//! | MRR        | `1 / rank`                | 1.0  |
//! | Accuracy@1 | 1 if rank is 1, else 0    | 1.0  |
//!
//! A [`RankResult`] either accumulates rounds ([`RankResult::add_rank`]) or accumulates other
//! results as single units ([`RankResult::add_result`]). The latter is how session results
//! combine into a cross-validation result: every session counts once, however many rounds it
//! has.

use std::fmt;

use serde::{Deserialize, Serialize};
use tangrams_stats::mean::RunningMean;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(into = "RankSummary")]
pub struct RankResult {
    rank: RunningMean,
    reciprocal_rank: RunningMean,
    accuracy: RunningMean,
}

impl RankResult {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one evaluated round.
    #[expect(clippy::cast_precision_loss)]
    pub fn add_rank(&mut self, rank: usize) {
        let rank = rank as f64;
        self.rank.push(rank);
        self.reciprocal_rank.push(1.0 / rank);
        self.accuracy.push(if rank == 1.0 { 1.0 } else { 0.0 });
    }

    /// Adds the means of `other` as one unit; an empty `other` is ignored.
    pub fn add_result(&mut self, other: &RankResult) {
        if let (Some(rank), Some(mrr), Some(accuracy)) =
            (other.mean_rank(), other.mrr(), other.accuracy())
        {
            self.rank.push(rank);
            self.reciprocal_rank.push(mrr);
            self.accuracy.push(accuracy);
        }
    }

    /// Number of rounds or results added.
    #[must_use]
    pub fn count(&self) -> usize {
        self.rank.count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[must_use]
    pub fn mean_rank(&self) -> Option<f64> {
        self.rank.value()
    }

    /// Mean reciprocal rank.
    #[must_use]
    pub fn mrr(&self) -> Option<f64> {
        self.reciprocal_rank.value()
    }

    /// Fraction of targets ranked first.
    #[must_use]
    pub fn accuracy(&self) -> Option<f64> {
        self.accuracy.value()
    }
}

impl FromIterator<usize> for RankResult {
    fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
        let mut result = Self::new();
        for rank in iter {
            result.add_rank(rank);
        }
        result
    }
}

impl<'a> FromIterator<&'a RankResult> for RankResult {
    fn from_iter<T: IntoIterator<Item = &'a RankResult>>(iter: T) -> Self {
        let mut result = Self::new();
        for other in iter {
            result.add_result(other);
        }
        result
    }
}

/// Formats as `mean_rank<TAB>mrr<TAB>accuracy` with three decimals (`NaN` when empty).
impl fmt::Display for RankResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3}\t{:.3}\t{:.3}",
            self.mean_rank().unwrap_or(f64::NAN),
            self.mrr().unwrap_or(f64::NAN),
            self.accuracy().unwrap_or(f64::NAN)
        )
    }
}

/// Serialized form of a [`RankResult`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankSummary {
    pub count: usize,
    pub mean_rank: Option<f64>,
    pub mrr: Option<f64>,
    pub accuracy: Option<f64>,
}

impl From<RankResult> for RankSummary {
    fn from(result: RankResult) -> Self {
        Self {
            count: result.count(),
            mean_rank: result.mean_rank(),
            mrr: result.mrr(),
            accuracy: result.accuracy(),
        }
    }
}
