//! Scoring and ranking referents.
//!
//! Ranking a round answers "which referent did the giver describe?". Every word of the
//! round's dialogue votes for each candidate with the probability its classifier assigns to
//! that candidate, and the candidates are ordered by the sum of the votes:
//!
//! ```text
//! score(referent) = Σ_{word ∈ words(round)} P_word(target | referent) · weight(word)
//! ```
//!
//! The word list keeps duplicates, so a word repeated in the dialogue votes once per use.
//!
//! # Fallback
//!
//! A word without its own classifier (out of vocabulary, or its training failed) is scored by
//! the out-of-vocabulary classifier, which was trained on the rounds that contained unknown
//! words. When that classifier is unavailable too, the word contributes [`NEUTRAL_SCORE`].
//!
//! # Word weights
//!
//! - `weight_by_freq`: `log10` of the word's vocabulary count ([`UNKNOWN_WORD_COUNT`] for
//!   unknown words, so they keep a positive weight whatever the discount)
//! - `weight_by_power`: the word's discriminative power (0 for unknown words)
//!
//! Both are 1 when disabled and multiply when both are enabled.
//!
//! # Ties
//!
//! Equal aggregate scores are ordered by ascending referent id; the sort is stable, so
//! referents with equal ids keep their order in the round.

use tangrams_data::{CorpusIntegrityError, Referent, Round, WordFilter};

use crate::{
    epoch::ModelEpoch,
    feature::{FeatureVector, SchemaViolation},
    logistic::{LogisticClassifier, PredictionError},
    params::ModelParams,
};

/// Score of a word that has no usable classifier.
pub const NEUTRAL_SCORE: f64 = 0.5;

/// Count assumed for words missing from the vocabulary when weighting by frequency.
pub const UNKNOWN_WORD_COUNT: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("failed to score word '{word}': {cause}")]
pub struct PredictionFailure {
    pub word: String,
    #[error(source)]
    pub cause: PredictionError,
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum ScoringError {
    #[display("invalid round: {_0}")]
    Corpus(CorpusIntegrityError),
    #[display("invalid referent: {_0}")]
    Schema(SchemaViolation),
    #[display("{_0}")]
    Prediction(PredictionFailure),
}

/// A referent with its aggregate score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedReferent<'a> {
    pub referent: &'a Referent,
    pub score: f64,
}

/// Scores referents given the words describing them.
///
/// Implementors provide the per-word score; aggregation and ranking are shared.
pub trait ReferentScorer {
    /// Which words of a round take part in the aggregate.
    fn word_filter(&self) -> WordFilter;

    /// Probability-like score in \[0, 1\] that `word` describes `referent`.
    fn score(&self, word: &str, referent: &Referent) -> Result<f64, ScoringError>;

    /// Multiplier of a word's score in the aggregate.
    fn word_weight(&self, _word: &str) -> f64 {
        1.0
    }

    fn aggregate_score(&self, round: &Round, referent: &Referent) -> Result<f64, ScoringError> {
        round
            .words(self.word_filter())
            .map(|word| Ok(self.score(word, referent)? * self.word_weight(word)))
            .sum::<Result<f64, ScoringError>>()
    }

    /// All referents of the round in descending score order.
    fn rank<'r>(&self, round: &'r Round) -> Result<Vec<RankedReferent<'r>>, ScoringError> {
        round.validate()?;
        let mut ranked = round
            .referents
            .iter()
            .map(|referent| {
                Ok(RankedReferent {
                    referent,
                    score: self.aggregate_score(round, referent)?,
                })
            })
            .collect::<Result<Vec<_>, ScoringError>>()?;
        ranked.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.referent.id.cmp(&b.referent.id))
        });
        Ok(ranked)
    }

    /// 1-based position of the target referent in [`ReferentScorer::rank`].
    fn target_rank(&self, round: &Round) -> Result<usize, ScoringError> {
        let ranked = self.rank(round)?;
        let position = ranked
            .iter()
            .position(|r| r.referent.is_target())
            .ok_or(CorpusIntegrityError::MissingTarget { round: round.n })?;
        Ok(position + 1)
    }
}

/// Scores with the classifiers of one model epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochScorer<'a> {
    epoch: &'a ModelEpoch,
    params: &'a ModelParams,
}

impl<'a> EpochScorer<'a> {
    #[must_use]
    pub fn new(epoch: &'a ModelEpoch, params: &'a ModelParams) -> Self {
        Self { epoch, params }
    }

    /// The classifier that scores `word`: its own, else the out-of-vocabulary one.
    #[must_use]
    pub fn classifier_for(&self, word: &str) -> Option<&'a LogisticClassifier> {
        self.epoch
            .classifiers
            .get(word)
            .or(self.epoch.discount.as_deref())
    }

    /// Scores an already encoded referent.
    pub fn score_features(
        &self,
        word: &str,
        features: &FeatureVector,
    ) -> Result<f64, PredictionFailure> {
        match self.classifier_for(word) {
            Some(classifier) => {
                classifier
                    .predict(features.as_slice())
                    .map_err(|cause| PredictionFailure {
                        word: word.to_owned(),
                        cause,
                    })
            }
            None => Ok(NEUTRAL_SCORE),
        }
    }
}

impl ReferentScorer for EpochScorer<'_> {
    fn word_filter(&self) -> WordFilter {
        self.params.word_filter()
    }

    fn score(&self, word: &str, referent: &Referent) -> Result<f64, ScoringError> {
        let features = self.epoch.schema.encode(referent)?;
        Ok(self.score_features(word, &features)?)
    }

    fn word_weight(&self, word: &str) -> f64 {
        let mut weight = 1.0;
        if self.params.weight_by_freq {
            let count = self.epoch.vocabulary.count_or(word, UNKNOWN_WORD_COUNT);
            weight *= f64::from(count).log10();
        }
        if self.params.weight_by_power {
            weight *= self.epoch.power.get(word).copied().unwrap_or(0.0);
        }
        weight
    }

    fn aggregate_score(&self, round: &Round, referent: &Referent) -> Result<f64, ScoringError> {
        let features = self.epoch.schema.encode(referent)?;
        round
            .words(self.word_filter())
            .map(|word| Ok(self.score_features(word, &features)? * self.word_weight(word)))
            .sum::<Result<f64, ScoringError>>()
    }
}

#[cfg(test)]
mod tests {
    use std::{collections::BTreeMap, sync::Arc};

    use tangrams_data::{TrainingPool, Utterance, Vocabulary};

    use super::*;
    use crate::{classifier::WordClassifiers, feature::FeatureSchema};

    /// Scores a referent by a fixed table keyed on referent id, ignoring the word.
    struct TableScorer(BTreeMap<u32, f64>);

    impl ReferentScorer for TableScorer {
        fn word_filter(&self) -> WordFilter {
            WordFilter::ALL
        }

        fn score(&self, _word: &str, referent: &Referent) -> Result<f64, ScoringError> {
            Ok(self.0[&referent.id])
        }
    }

    fn round(words: &[&str], referents: Vec<Referent>) -> Round {
        Round::new(
            1,
            vec![Utterance::new("a", true, words.iter().copied())],
            referents,
        )
    }

    #[test]
    fn test_aggregate_sums_every_occurrence() {
        let scorer = TableScorer([(1, 0.25)].into());
        let r = round(
            &["red", "red", "one"],
            vec![Referent::new(1, 1, "a").with_target(true)],
        );
        let score = scorer.aggregate_score(&r, &r.referents[0]).unwrap();
        assert!((score - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_rank_orders_by_score_then_id() {
        let scorer = TableScorer([(1, 0.2), (2, 0.9), (3, 0.2), (4, 0.5)].into());
        let r = round(
            &["x"],
            vec![
                Referent::new(3, 1, "a"),
                Referent::new(1, 1, "a").with_target(true),
                Referent::new(4, 1, "a"),
                Referent::new(2, 1, "a"),
            ],
        );
        let ids = scorer
            .rank(&r)
            .unwrap()
            .iter()
            .map(|ranked| ranked.referent.id)
            .collect::<Vec<_>>();
        assert_eq!(ids, [2, 4, 1, 3]);
        assert_eq!(scorer.target_rank(&r).unwrap(), 3);
    }

    #[test]
    fn test_rank_without_words_keeps_id_order() {
        let scorer = TableScorer([(1, 0.2), (2, 0.9)].into());
        let r = round(
            &[],
            vec![
                Referent::new(2, 1, "a").with_target(true),
                Referent::new(1, 1, "a"),
            ],
        );
        let ranked = scorer.rank(&r).unwrap();
        assert!(ranked.iter().all(|r| r.score == 0.0));
        assert_eq!(scorer.target_rank(&r).unwrap(), 2);
    }

    #[test]
    fn test_invalid_round_is_rejected() {
        let scorer = TableScorer([(1, 0.2), (2, 0.9)].into());
        let r = round(&["x"], vec![Referent::new(1, 1, "a"), Referent::new(2, 1, "a")]);
        assert!(matches!(
            scorer.target_rank(&r),
            Err(ScoringError::Corpus(CorpusIntegrityError::MissingTarget { round: 1 }))
        ));
    }

    fn epoch_with(
        classifiers: WordClassifiers,
        discount: Option<LogisticClassifier>,
        vocabulary: Vocabulary,
    ) -> ModelEpoch {
        ModelEpoch {
            version: 0,
            schema: FeatureSchema::new(["a"]),
            vocabulary,
            classifiers,
            discount: discount.map(Arc::new),
            power: [("red".to_owned(), 0.5)].into(),
            pool: TrainingPool::default(),
            failures: vec![],
        }
    }

    /// Responds to the `red` column only (column 2 after `shape=a` and `size`).
    fn red_classifier() -> Arc<LogisticClassifier> {
        let mut coefficients = vec![0.0; 9];
        coefficients[2] = 8.0;
        Arc::new(LogisticClassifier {
            intercept: -4.0,
            coefficients,
        })
    }

    #[test]
    fn test_epoch_scorer_fallbacks() {
        let classifiers = [("red".to_owned(), red_classifier())]
            .into_iter()
            .collect::<WordClassifiers>();
        let discount = LogisticClassifier {
            intercept: 0.0,
            coefficients: vec![0.0; 9],
        };
        let vocabulary = ["red"; 3].into_iter().collect::<Vocabulary>();
        let params = ModelParams::default();
        let red = Referent::new(1, 1, "a").with_color(1.0, 0.0, 0.0);

        let epoch = epoch_with(classifiers.clone(), Some(discount), vocabulary.clone());
        let scorer = epoch.scorer(&params);
        assert!(scorer.score("red", &red).unwrap() > 0.98);
        assert!((scorer.score("unknown", &red).unwrap() - 0.5).abs() < 1e-12);

        let epoch = epoch_with(classifiers, None, vocabulary);
        let scorer = epoch.scorer(&params);
        assert_eq!(scorer.score("unknown", &red).unwrap(), NEUTRAL_SCORE);
        assert!(matches!(
            scorer.score("red", &Referent::new(1, 1, "z")),
            Err(ScoringError::Schema(_))
        ));
    }

    #[test]
    fn test_epoch_scorer_word_weights() {
        let vocabulary = ["red"; 100].into_iter().collect::<Vocabulary>();
        let epoch = epoch_with(WordClassifiers::new(), None, vocabulary);

        let params = ModelParams {
            weight_by_freq: true,
            ..ModelParams::default()
        };
        let scorer = epoch.scorer(&params);
        assert!((scorer.word_weight("red") - 2.0).abs() < 1e-12);
        assert!((scorer.word_weight("other") - 3.0_f64.log10()).abs() < 1e-12);

        let params = ModelParams {
            weight_by_freq: true,
            weight_by_power: true,
            ..ModelParams::default()
        };
        let scorer = epoch.scorer(&params);
        assert!((scorer.word_weight("red") - 1.0).abs() < 1e-12);
        assert_eq!(scorer.word_weight("other"), 0.0);
    }

    #[test]
    fn test_unknown_words_keep_a_finite_weight_without_discount() {
        let classifiers = [("red".to_owned(), red_classifier())]
            .into_iter()
            .collect::<WordClassifiers>();
        let vocabulary = ["red"; 10].into_iter().collect::<Vocabulary>();
        let epoch = epoch_with(classifiers, None, vocabulary);
        let params = ModelParams {
            discount: 0,
            weight_by_freq: true,
            ..ModelParams::default()
        };
        let scorer = epoch.scorer(&params);
        assert!((scorer.word_weight("re-") - 3.0_f64.log10()).abs() < 1e-12);

        let r = round(
            &["re-", "red"],
            vec![
                Referent::new(1, 1, "a").with_color(0.0, 0.0, 1.0),
                Referent::new(2, 1, "a")
                    .with_color(1.0, 0.0, 0.0)
                    .with_target(true),
            ],
        );
        let ranked = scorer.rank(&r).unwrap();
        assert!(ranked.iter().all(|r| r.score.is_finite()));
        assert_eq!(ranked[0].referent.id, 2);
    }

    #[test]
    fn test_red_referent_ranks_first() {
        let classifiers = [("red".to_owned(), red_classifier())]
            .into_iter()
            .collect::<WordClassifiers>();
        let vocabulary = ["red"; 3].into_iter().collect::<Vocabulary>();
        let epoch = epoch_with(classifiers, None, vocabulary);
        let params = ModelParams::default();

        let r = round(
            &["the", "red", "one"],
            vec![
                Referent::new(1, 1, "a").with_color(0.0, 0.0, 1.0),
                Referent::new(2, 1, "a")
                    .with_color(1.0, 0.0, 0.0)
                    .with_target(true),
                Referent::new(3, 1, "a").with_color(0.0, 1.0, 0.0),
            ],
        );
        assert_eq!(epoch.scorer(&params).target_rank(&r).unwrap(), 1);
    }
}
