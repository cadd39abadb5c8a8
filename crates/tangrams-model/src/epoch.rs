//! Immutable model states.
//!
//! A trained model is a sequence of epochs. Training produces the first epoch; every
//! incremental update derives a new epoch from the previous one without modifying it. The
//! live model holds the current epoch behind an [`Arc`](std::sync::Arc), so a snapshot is a
//! pointer copy and restoring it is a pointer swap.

use std::{collections::BTreeMap, sync::Arc};

use tangrams_data::{TrainingPool, Vocabulary};

use crate::{
    classifier::{TrainingFailure, WordClassifiers},
    feature::FeatureSchema,
    logistic::LogisticClassifier,
    params::ModelParams,
    scoring::EpochScorer,
};

#[derive(Debug, Clone)]
pub struct ModelEpoch {
    /// 0 for a freshly trained model, incremented by every update.
    pub version: u64,
    pub schema: FeatureSchema,
    /// Pruned vocabulary of `pool`.
    pub vocabulary: Vocabulary,
    pub classifiers: WordClassifiers,
    /// Out-of-vocabulary classifier, if it could be trained.
    pub discount: Option<Arc<LogisticClassifier>>,
    /// Discriminative power per word (empty unless power weighting is enabled).
    pub power: BTreeMap<String, f64>,
    /// The weighted rounds this epoch was trained on.
    pub pool: TrainingPool,
    /// Classifiers that failed to train while building this epoch and its ancestors.
    pub failures: Vec<TrainingFailure>,
}

impl ModelEpoch {
    #[must_use]
    pub fn scorer<'a>(&'a self, params: &'a ModelParams) -> EpochScorer<'a> {
        EpochScorer::new(self, params)
    }
}
