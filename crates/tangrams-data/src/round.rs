//! Game rounds: one dialogue and one set of candidate referents.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{Referent, Utterance, Vocabulary, WordFilter};

/// A round that cannot be scored.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum CorpusIntegrityError {
    #[display("round {round} has no referents")]
    NoReferents { round: i32 },
    #[display("round {round} has no target referent")]
    MissingTarget { round: i32 },
    #[display("round {round} has {count} target referents")]
    MultipleTargets { round: i32, count: usize },
}

/// One game turn: a dialogue, a fixed set of referents and the target among them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    /// Round number within the session (1-based).
    pub n: i32,
    pub utterances: Vec<Utterance>,
    pub referents: Vec<Referent>,
}

impl Round {
    #[must_use]
    pub fn new(n: i32, utterances: Vec<Utterance>, referents: Vec<Referent>) -> Self {
        Self {
            n,
            utterances,
            referents,
        }
    }

    /// Checks that the round can be scored and returns its target.
    pub fn validate(&self) -> Result<&Referent, CorpusIntegrityError> {
        if self.referents.is_empty() {
            return Err(CorpusIntegrityError::NoReferents { round: self.n });
        }
        let mut targets = self.referents.iter().filter(|r| r.is_target());
        let target = targets
            .next()
            .ok_or(CorpusIntegrityError::MissingTarget { round: self.n })?;
        let extra = targets.count();
        if extra > 0 {
            return Err(CorpusIntegrityError::MultipleTargets {
                round: self.n,
                count: extra + 1,
            });
        }
        Ok(target)
    }

    /// The first target referent, if any.
    #[must_use]
    pub fn target(&self) -> Option<&Referent> {
        self.referents.iter().find(|r| r.is_target())
    }

    /// Words used in this round, in utterance order and with repetitions.
    pub fn words(&self, filter: WordFilter) -> impl Iterator<Item = &str> + '_ {
        self.utterances
            .iter()
            .filter(move |utt| !filter.only_giver || utt.is_giver)
            .flat_map(move |utt| {
                if filter.only_referring_language {
                    &utt.ref_text
                } else {
                    &utt.full_text
                }
            })
            .map(String::as_str)
            .filter(|w| !w.is_empty())
    }

    /// Distinct words used in this round.
    #[must_use]
    pub fn unique_words(&self, filter: WordFilter) -> BTreeSet<&str> {
        self.words(filter).collect()
    }

    #[must_use]
    pub fn has_word(&self, word: &str, filter: WordFilter) -> bool {
        self.words(filter).any(|w| w == word)
    }

    /// Whether the round uses at least one word that is not in `vocabulary`.
    #[must_use]
    pub fn has_word_outside(&self, vocabulary: &Vocabulary, filter: WordFilter) -> bool {
        self.words(filter).any(|w| !vocabulary.contains(w))
    }

    /// Whether the giver negated something in this round.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.utterances
            .iter()
            .any(|utt| utt.is_giver && utt.is_negative())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round() -> Round {
        Round::new(
            1,
            vec![
                Utterance::new("A", true, ["the", "red", "one", "the", "red"])
                    .with_ref_text(["red", "one"]),
                Utterance::new("B", false, ["no", "the", "blue"]).with_ref_text(["blue"]),
            ],
            vec![
                Referent::new(1, 1, "wedge").with_target(true),
                Referent::new(2, 1, "heart"),
            ],
        )
    }

    #[test]
    fn test_words_keep_repetitions() {
        let words = round().words(WordFilter::ALL).collect::<Vec<_>>().join(" ");
        assert_eq!(words, "the red one the red no the blue");
    }

    #[test]
    fn test_only_giver() {
        let filter = WordFilter {
            only_giver: true,
            only_referring_language: false,
        };
        let round = round();
        assert_eq!(round.words(filter).count(), 5);
        assert!(!round.has_word("blue", filter));
    }

    #[test]
    fn test_only_referring_language() {
        let filter = WordFilter {
            only_giver: false,
            only_referring_language: true,
        };
        let round = round();
        let words = round.unique_words(filter);
        assert_eq!(words.into_iter().collect::<Vec<_>>(), ["blue", "one", "red"]);
    }

    #[test]
    fn test_validate() {
        let mut round = round();
        assert_eq!(round.validate().map(|t| t.id), Ok(1));

        round.referents[1] = round.referents[1].clone().with_target(true);
        assert_eq!(
            round.validate(),
            Err(CorpusIntegrityError::MultipleTargets { round: 1, count: 2 })
        );

        round.referents.iter_mut().for_each(|r| *r = r.clone().with_target(false));
        assert_eq!(
            round.validate(),
            Err(CorpusIntegrityError::MissingTarget { round: 1 })
        );

        round.referents.clear();
        assert_eq!(
            round.validate(),
            Err(CorpusIntegrityError::NoReferents { round: 1 })
        );
    }

    #[test]
    fn test_is_negative_only_counts_giver() {
        let round = round();
        assert!(!round.is_negative());
        let mut negated = round.clone();
        negated.utterances[0].full_text.push("nope".to_owned());
        assert!(negated.is_negative());
    }
}
