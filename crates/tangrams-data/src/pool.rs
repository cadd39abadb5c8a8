//! The weighted rounds a model is trained on.
//!
//! Rounds loaded from the training sessions enter the pool with weight 1.0; rounds added
//! while a model updates itself during evaluation carry a separate update weight. The
//! weight lives next to the shared round rather than inside it, so adding a round to one
//! fold's pool never affects the corpus or any other fold.

use std::sync::Arc;

use crate::{Referent, Round, SessionSet, Vocabulary, WordFilter};

#[derive(Debug, Clone)]
pub struct WeightedRound {
    pub round: Arc<Round>,
    pub weight: f64,
}

#[derive(Debug, Clone, Default)]
pub struct TrainingPool {
    rounds: Vec<WeightedRound>,
}

impl TrainingPool {
    /// Collects every round of every session with weight 1.0.
    #[must_use]
    pub fn from_sessions(set: &SessionSet) -> Self {
        let rounds = set
            .rounds()
            .map(|round| WeightedRound {
                round: Arc::clone(round),
                weight: 1.0,
            })
            .collect();
        Self { rounds }
    }

    pub fn push(&mut self, round: Arc<Round>, weight: f64) {
        self.rounds.push(WeightedRound { round, weight });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    #[must_use]
    pub fn rounds(&self) -> &[WeightedRound] {
        &self.rounds
    }

    /// Every referent of every round.
    pub fn referents(&self) -> impl Iterator<Item = &Referent> + '_ {
        self.rounds.iter().flat_map(|wr| &wr.round.referents)
    }

    /// Document-frequency vocabulary: each word counts once per round it occurs in.
    ///
    /// Words seen in fewer than `min_count` rounds, or ending in the truncation marker, are
    /// pruned.
    #[must_use]
    pub fn vocabulary(&self, filter: WordFilter, min_count: u32) -> Vocabulary {
        let mut vocab = self
            .rounds
            .iter()
            .flat_map(|wr| wr.round.unique_words(filter))
            .collect::<Vocabulary>();
        vocab.prune(min_count);
        vocab
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Session, Utterance};

    fn round(n: i32, text: &[&str]) -> Round {
        Round::new(
            n,
            vec![Utterance::new("A", true, text.iter().copied())],
            vec![
                Referent::new(1, n, "wedge").with_target(true),
                Referent::new(2, n, "heart"),
            ],
        )
    }

    fn pool() -> TrainingPool {
        let session = Session::new(
            "s",
            vec![
                round(1, &["red", "red", "one"]),
                round(2, &["red", "square"]),
                round(3, &["blue", "one"]),
            ],
        );
        TrainingPool::from_sessions(&session.into())
    }

    #[test]
    fn test_vocabulary_counts_rounds_not_tokens() {
        let vocab = pool().vocabulary(WordFilter::ALL, 1);
        assert_eq!(vocab.count("red"), Some(2));
        assert_eq!(vocab.count("one"), Some(2));
        assert_eq!(vocab.count("blue"), Some(1));

        let pruned = pool().vocabulary(WordFilter::ALL, 2);
        assert_eq!(pruned.words().collect::<Vec<_>>(), ["one", "red"]);
    }
}
