//! Parallel training of word classifiers.
//!
//! A training batch fits one classifier per requested word plus the out-of-vocabulary
//! classifier. The jobs are independent: each reads the shared, immutable training pool and
//! produces its own result, so they run on a bounded [`rayon`] thread pool without any
//! shared mutable state. [`TrainingEngine::train_batch`] returns only after every job has
//! finished; the results are then assembled into a [`TrainingBatch`] in word order.
//!
//! # Training Sets
//!
//! The training set of word `w` consists of every referent of every pool round whose dialogue
//! contains `w` (after word filtering). The out-of-vocabulary classifier is trained on every
//! referent of every round that contains at least one word outside the vocabulary. Each
//! referent is weighted by [`ModelParams::instance_weight`].
//!
//! # Failure Isolation
//!
//! A classifier that cannot be fitted yields a [`TrainingFailure`] for its word. The failure
//! is collected into the batch and logged; every other job is unaffected.

use std::{collections::BTreeMap, sync::Arc};

use rayon::prelude::*;
use tangrams_data::{Round, TrainingPool, Vocabulary};
use tangrams_model::{
    FeatureSchema, FeatureVector, LogisticClassifier, LogisticRegression, ModelParams,
    SchemaViolation, TrainingFailure,
    classifier::OUT_OF_VOCABULARY,
    logistic::{Example, FitError, PredictionError},
};
use tangrams_stats::descriptive::sample_std_dev;
use tracing::{debug, info, warn};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum EngineError {
    #[display("failed to build training thread pool: {_0}")]
    ThreadPool(rayon::ThreadPoolBuildError),
}

/// The results of one training batch.
#[derive(Debug, Clone, Default)]
pub struct TrainingBatch {
    /// Successfully trained classifiers in word order.
    pub classifiers: Vec<(String, Arc<LogisticClassifier>)>,
    pub discount: Option<Arc<LogisticClassifier>>,
    /// Discriminative power of each trained word (empty unless power weighting is enabled).
    pub power: BTreeMap<String, f64>,
    pub failures: Vec<TrainingFailure>,
}

/// Trains word classifiers on a bounded worker pool.
#[derive(Debug)]
pub struct TrainingEngine {
    params: ModelParams,
    pool: rayon::ThreadPool,
}

impl TrainingEngine {
    /// Creates an engine with `threads` workers; 0 uses one worker per logical CPU.
    pub fn new(params: ModelParams, threads: usize) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tangrams-train-{i}"))
            .build()?;
        Ok(Self { params, pool })
    }

    #[must_use]
    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Trains `words` and the out-of-vocabulary classifier on `pool`.
    ///
    /// Fails only when a pool referent cannot be encoded with `schema`; classifier failures
    /// are reported inside the batch.
    pub fn train_batch(
        &self,
        pool: &TrainingPool,
        schema: &FeatureSchema,
        vocabulary: &Vocabulary,
        words: &[String],
    ) -> Result<TrainingBatch, SchemaViolation> {
        let encoded = EncodedPool::new(pool, schema)?;
        info!(
            "Training {} word classifiers on {} rounds ({} threads)",
            words.len(),
            pool.len(),
            self.threads()
        );

        let (discount, results) = self.pool.install(|| {
            rayon::join(
                || self.train_discount(&encoded, vocabulary),
                || {
                    words
                        .par_iter()
                        .map(|word| (word, self.train_word(&encoded, word)))
                        .collect::<Vec<_>>()
                },
            )
        });

        let mut batch = TrainingBatch::default();
        match discount {
            Ok(classifier) => batch.discount = Some(Arc::new(classifier)),
            Err(cause) => {
                warn!("Out-of-vocabulary classifier not trained: {cause}");
                batch.failures.push(TrainingFailure {
                    word: OUT_OF_VOCABULARY.to_owned(),
                    cause,
                });
            }
        }
        for (word, result) in results {
            match result {
                Ok((classifier, power)) => {
                    if let Some(power) = power {
                        batch.power.insert(word.clone(), power);
                    }
                    batch.classifiers.push((word.clone(), Arc::new(classifier)));
                }
                Err(cause) => {
                    warn!("Classifier for '{word}' not trained: {cause}");
                    batch.failures.push(TrainingFailure {
                        word: word.clone(),
                        cause,
                    });
                }
            }
        }

        info!(
            "Trained {} classifiers, {} failures",
            batch.classifiers.len(),
            batch.failures.len()
        );
        Ok(batch)
    }

    fn regression(&self) -> LogisticRegression {
        LogisticRegression::new(self.params.effective_ridge())
    }

    fn train_word(
        &self,
        encoded: &EncodedPool<'_>,
        word: &str,
    ) -> Result<(LogisticClassifier, Option<f64>), FitError> {
        let filter = self.params.word_filter();
        let examples = encoded.examples(&self.params, |round| round.has_word(word, filter));
        let classifier = self.regression().fit(&examples)?;
        debug!(
            "Trained '{word}' on {} instances (intercept {:.3})",
            examples.len(),
            classifier.intercept
        );

        let power = self
            .params
            .weight_by_power
            .then(|| discriminative_power(&classifier, encoded))
            .transpose()
            .map_err(FitError::Power)?;
        Ok((classifier, power))
    }

    fn train_discount(
        &self,
        encoded: &EncodedPool<'_>,
        vocabulary: &Vocabulary,
    ) -> Result<LogisticClassifier, FitError> {
        let filter = self.params.word_filter();
        let examples =
            encoded.examples(&self.params, |round| round.has_word_outside(vocabulary, filter));
        self.regression().fit(&examples)
    }
}

/// Spread of a classifier's scores over every referent of the pool.
///
/// A word whose score hardly depends on the referent carries little information about which
/// referent is meant.
fn discriminative_power(
    classifier: &LogisticClassifier,
    encoded: &EncodedPool<'_>,
) -> Result<f64, PredictionError> {
    let scores = encoded
        .rounds
        .iter()
        .flat_map(|round| &round.features)
        .map(|features| classifier.predict(features.as_slice()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sample_std_dev(scores).unwrap_or(0.0))
}

/// A pool round with its referents encoded once for all jobs of a batch.
#[derive(Debug)]
struct EncodedRound<'a> {
    round: &'a Round,
    weight: f64,
    features: Vec<FeatureVector>,
}

#[derive(Debug)]
struct EncodedPool<'a> {
    rounds: Vec<EncodedRound<'a>>,
}

impl<'a> EncodedPool<'a> {
    fn new(pool: &'a TrainingPool, schema: &FeatureSchema) -> Result<Self, SchemaViolation> {
        let rounds = pool
            .rounds()
            .iter()
            .map(|wr| {
                let features = wr
                    .round
                    .referents
                    .iter()
                    .map(|referent| schema.encode(referent))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(EncodedRound {
                    round: wr.round.as_ref(),
                    weight: wr.weight,
                    features,
                })
            })
            .collect::<Result<Vec<_>, SchemaViolation>>()?;
        Ok(Self { rounds })
    }

    /// Weighted instances of every referent in the rounds selected by `pred`.
    fn examples<F>(&self, params: &ModelParams, pred: F) -> Vec<Example<'_>>
    where
        F: Fn(&Round) -> bool,
    {
        self.rounds
            .iter()
            .filter(|encoded| pred(encoded.round))
            .flat_map(|encoded| {
                encoded
                    .round
                    .referents
                    .iter()
                    .zip(&encoded.features)
                    .map(|(referent, features)| Example {
                        features,
                        target: referent.is_target(),
                        weight: params.instance_weight(encoded.weight, referent.is_target()),
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use tangrams_data::{Referent, SessionSet, Utterance, WordFilter, synthetic::SyntheticCorpus};

    use super::*;

    fn two_referent_round(words: &[&str]) -> Round {
        Round::new(
            1,
            vec![Utterance::new("a", true, words.iter().copied())],
            vec![
                Referent::new(1, 1, "a").with_color(1.0, 0.0, 0.0).with_target(true),
                Referent::new(2, 1, "b").with_color(0.0, 0.0, 1.0),
            ],
        )
    }

    #[test]
    fn test_instance_weights() {
        let mut pool = TrainingPool::default();
        pool.push(Arc::new(two_referent_round(&["red"])), 1.0);
        pool.push(Arc::new(two_referent_round(&["red"])), 2.5);
        pool.push(Arc::new(two_referent_round(&["blue"])), 7.0);
        let schema = FeatureSchema::new(["a", "b"]);
        let encoded = EncodedPool::new(&pool, &schema).unwrap();

        let params = ModelParams::default();
        let examples =
            encoded.examples(&params, |round| round.has_word("red", WordFilter::ALL));
        let weights = examples
            .iter()
            .map(|e| (e.target, e.weight))
            .collect::<Vec<_>>();
        assert_eq!(
            weights,
            [(true, 19.0), (false, 1.0), (true, 19.0 * 2.5), (false, 2.5)]
        );
    }

    #[test]
    fn test_out_of_vocabulary_examples() {
        let mut pool = TrainingPool::default();
        pool.push(Arc::new(two_referent_round(&["red", "one"])), 1.0);
        pool.push(Arc::new(two_referent_round(&["red", "square"])), 2.0);
        pool.push(Arc::new(two_referent_round(&["blue", "one"])), 3.0);
        let vocabulary = pool.vocabulary(WordFilter::ALL, 2);
        let schema = FeatureSchema::new(["a", "b"]);
        let encoded = EncodedPool::new(&pool, &schema).unwrap();

        // only the rounds using "square" and "blue" fall outside the vocabulary
        let params = ModelParams::default();
        let examples = encoded.examples(&params, |round| {
            round.has_word_outside(&vocabulary, WordFilter::ALL)
        });
        let weights = examples
            .iter()
            .map(|e| (e.target, e.weight))
            .collect::<Vec<_>>();
        assert_eq!(
            weights,
            [(true, 38.0), (false, 2.0), (true, 57.0), (false, 3.0)]
        );
    }

    #[test]
    fn test_unknown_shape_fails_batch() {
        let mut pool = TrainingPool::default();
        pool.push(Arc::new(two_referent_round(&["red"])), 1.0);
        let engine = TrainingEngine::new(ModelParams::default(), 1).unwrap();
        let vocabulary = Vocabulary::new();
        let err = engine
            .train_batch(&pool, &FeatureSchema::new(["a"]), &vocabulary, &[])
            .unwrap_err();
        assert_eq!(err.shape, "b");
    }

    #[test]
    fn test_failures_are_isolated() {
        let corpus = SyntheticCorpus {
            sessions: 2,
            rounds_per_session: 10,
            referents_per_round: 6,
            ..SyntheticCorpus::default()
        }
        .generate();
        let mut pool = TrainingPool::from_sessions(&corpus);
        // a round without a target only ever produces negative instances
        let mut round = two_referent_round(&["lonely"]);
        round.referents[0] = round.referents[0].clone().with_target(false);
        round.referents[1].shape = "a".to_owned();
        pool.push(Arc::new(round), 1.0);

        let mut shapes = corpus.shapes();
        shapes.insert("a".to_owned());
        let schema = FeatureSchema::new(shapes);
        let params = ModelParams::default();
        let vocabulary = pool.vocabulary(params.word_filter(), 1);
        let words = vocabulary.words().map(str::to_owned).collect::<Vec<_>>();

        let engine = TrainingEngine::new(params, 2).unwrap();
        let batch = engine
            .train_batch(&pool, &schema, &vocabulary, &words)
            .unwrap();

        // everything is in the vocabulary, so there is nothing to train the fallback on
        assert!(batch.discount.is_none());
        assert_eq!(
            batch.failures,
            [
                TrainingFailure {
                    word: OUT_OF_VOCABULARY.to_owned(),
                    cause: FitError::Empty,
                },
                TrainingFailure {
                    word: "lonely".to_owned(),
                    cause: FitError::SingleClass,
                },
            ]
        );
        assert_eq!(batch.classifiers.len(), words.len() - 1);
        assert!(batch.classifiers.iter().all(|(w, _)| w != "lonely"));
    }

    #[test]
    fn test_batch_is_independent_of_thread_count() {
        let corpus: SessionSet = SyntheticCorpus {
            sessions: 3,
            rounds_per_session: 8,
            ..SyntheticCorpus::default()
        }
        .generate();
        let pool = TrainingPool::from_sessions(&corpus);
        let schema = FeatureSchema::new(corpus.shapes());
        let params = ModelParams {
            weight_by_power: true,
            ..ModelParams::default()
        };
        let vocabulary = pool.vocabulary(params.word_filter(), params.discount);
        let words = vocabulary.words().map(str::to_owned).collect::<Vec<_>>();

        let single = TrainingEngine::new(params.clone(), 1).unwrap();
        let multi = TrainingEngine::new(params, 4).unwrap();
        let a = single.train_batch(&pool, &schema, &vocabulary, &words).unwrap();
        let b = multi.train_batch(&pool, &schema, &vocabulary, &words).unwrap();

        assert!(!a.classifiers.is_empty());
        assert_eq!(a.classifiers, b.classifiers);
        assert_eq!(a.power, b.power);
        assert_eq!(a.power.len(), a.classifiers.len());
        assert_eq!(a.discount, b.discount);
    }

    #[test]
    fn test_power_fails_when_a_referent_cannot_be_scored() {
        let mut pool = TrainingPool::default();
        pool.push(Arc::new(two_referent_round(&["red"])), 1.0);
        let schema = FeatureSchema::new(["a", "b"]);
        let encoded = EncodedPool::new(&pool, &schema).unwrap();

        let classifier = LogisticClassifier {
            intercept: 0.0,
            coefficients: vec![1.0; 3],
        };
        assert_eq!(
            discriminative_power(&classifier, &encoded),
            Err(PredictionError::DimensionMismatch {
                expected: 3,
                found: schema.len(),
            })
        );
    }

    #[test]
    fn test_power_is_sample_std_dev_of_scores() {
        let corpus = SyntheticCorpus {
            sessions: 2,
            rounds_per_session: 10,
            ..SyntheticCorpus::default()
        }
        .generate();
        let pool = TrainingPool::from_sessions(&corpus);
        let schema = FeatureSchema::new(corpus.shapes());
        let params = ModelParams {
            weight_by_power: true,
            ..ModelParams::default()
        };
        let vocabulary = pool.vocabulary(params.word_filter(), params.discount);
        let word = vocabulary.words_sorted_by_freq()[0].to_owned();

        let engine = TrainingEngine::new(params, 1).unwrap();
        let batch = engine
            .train_batch(&pool, &schema, &vocabulary, std::slice::from_ref(&word))
            .unwrap();
        let (_, classifier) = &batch.classifiers[0];

        let scores = pool
            .referents()
            .map(|r| classifier.predict(schema.encode(r).unwrap().as_slice()).unwrap())
            .collect::<Vec<_>>();
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / (n - 1.0);
        assert!((batch.power[&word] - variance.sqrt()).abs() < 1e-9);
    }
}
