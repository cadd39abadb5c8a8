//! The live words-as-classifiers model.
//!
//! [`WordModel`] couples a [`TrainingEngine`] with the current [`ModelEpoch`]. Training
//! creates epoch 0; [`WordModel::update_model`] derives the next epoch by adding one round
//! to the training pool and retraining only the words whose counts changed. Because epochs
//! are immutable and shared through [`Arc`], [`WordModel::snapshot`] and
//! [`WordModel::restore`] are pointer operations:
//!
//! ```text
//! train ──► epoch 0 ──update──► epoch 1 ──update──► epoch 2
//!              ▲                                       │
//!              └──────────────── restore ◄─────────────┘
//! ```

use std::sync::Arc;

use tangrams_data::{Referent, Round, SessionSet, TrainingPool, Vocabulary};
use tangrams_model::{
    EpochScorer, FeatureSchema, ModelEpoch, ModelParams, RankedReferent, ReferentScorer,
    SchemaViolation, ScoringError, TrainingFailure, WordClassifiers,
};
use tracing::info;

use crate::engine::TrainingEngine;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum TrainError {
    #[display("training set contains no rounds")]
    #[from(skip)]
    EmptyTrainingSet,
    #[display("training set does not match the feature schema: {_0}")]
    Schema(SchemaViolation),
}

/// A saved model state.
#[derive(Debug, Clone)]
pub struct ModelSnapshot(Arc<ModelEpoch>);

impl ModelSnapshot {
    #[must_use]
    pub fn version(&self) -> u64 {
        self.0.version
    }
}

#[derive(Debug, Clone)]
pub struct WordModel<'e> {
    engine: &'e TrainingEngine,
    epoch: Arc<ModelEpoch>,
}

impl<'e> WordModel<'e> {
    /// Trains a model on every round of `set`, with a schema covering the shapes of `set`.
    pub fn train(engine: &'e TrainingEngine, set: &SessionSet) -> Result<Self, TrainError> {
        Self::train_with_schema(engine, set, FeatureSchema::new(set.shapes()))
    }

    pub fn train_with_schema(
        engine: &'e TrainingEngine,
        set: &SessionSet,
        schema: FeatureSchema,
    ) -> Result<Self, TrainError> {
        Self::train_pool(engine, TrainingPool::from_sessions(set), schema)
    }

    pub fn train_pool(
        engine: &'e TrainingEngine,
        pool: TrainingPool,
        schema: FeatureSchema,
    ) -> Result<Self, TrainError> {
        if pool.is_empty() {
            return Err(TrainError::EmptyTrainingSet);
        }
        let params = engine.params();
        let vocabulary = pool.vocabulary(params.word_filter(), params.discount);
        let words = vocabulary.words().map(str::to_owned).collect::<Vec<_>>();
        info!(
            "Training model on {} rounds, vocabulary of {} words",
            pool.len(),
            vocabulary.len()
        );

        let batch = engine.train_batch(&pool, &schema, &vocabulary, &words)?;
        let epoch = ModelEpoch {
            version: 0,
            schema,
            vocabulary,
            classifiers: batch.classifiers.into_iter().collect::<WordClassifiers>(),
            discount: batch.discount,
            power: batch.power,
            pool,
            failures: batch.failures,
        };
        Ok(Self {
            engine,
            epoch: Arc::new(epoch),
        })
    }

    /// Adds `round` to the training pool and retrains the words it affects.
    ///
    /// The round enters the pool with the configured update weight. Only words that are new,
    /// or whose count changed while it was at most `update_max_count`, are retrained; the
    /// out-of-vocabulary classifier is always retrained. Words that left the vocabulary lose
    /// their classifier. A word (or the out-of-vocabulary model)
    /// whose retraining fails keeps its previous classifier.
    pub fn update_model(&mut self, round: Arc<Round>) -> Result<(), TrainError> {
        let params = self.engine.params();
        let old = &self.epoch;

        let mut pool = old.pool.clone();
        pool.push(round, params.update_weight);
        let vocabulary = pool.vocabulary(params.word_filter(), params.discount);
        let words = vocabulary.updated_words_since(&old.vocabulary, params.update_max_count);

        let batch = self
            .engine
            .train_batch(&pool, &old.schema, &vocabulary, &words)?;

        let classifiers = old.classifiers.overlay(batch.classifiers, &vocabulary);
        let mut power = old.power.clone();
        power.extend(batch.power);
        power.retain(|word, _| vocabulary.contains(word));
        let mut failures = old.failures.clone();
        failures.extend(batch.failures);

        let epoch = ModelEpoch {
            version: old.version + 1,
            schema: old.schema.clone(),
            vocabulary,
            classifiers,
            discount: batch.discount.or_else(|| old.discount.clone()),
            power,
            pool,
            failures,
        };
        self.epoch = Arc::new(epoch);
        Ok(())
    }

    #[must_use]
    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot(Arc::clone(&self.epoch))
    }

    pub fn restore(&mut self, snapshot: ModelSnapshot) {
        self.epoch = snapshot.0;
    }

    #[must_use]
    pub fn epoch(&self) -> &ModelEpoch {
        &self.epoch
    }

    #[must_use]
    pub fn params(&self) -> &'e ModelParams {
        self.engine.params()
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.epoch.vocabulary
    }

    #[must_use]
    pub fn failures(&self) -> &[TrainingFailure] {
        &self.epoch.failures
    }

    #[must_use]
    pub fn scorer(&self) -> EpochScorer<'_> {
        self.epoch.scorer(self.engine.params())
    }

    pub fn score(&self, word: &str, referent: &Referent) -> Result<f64, ScoringError> {
        self.scorer().score(word, referent)
    }

    pub fn rank<'r>(&self, round: &'r Round) -> Result<Vec<RankedReferent<'r>>, ScoringError> {
        self.scorer().rank(round)
    }

    pub fn target_rank(&self, round: &Round) -> Result<usize, ScoringError> {
        self.scorer().target_rank(round)
    }
}
