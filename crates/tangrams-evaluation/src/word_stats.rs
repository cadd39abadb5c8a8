//! Per-word score statistics.
//!
//! For each vocabulary word, compares the mean score the model gives to target referents
//! with the mean score it gives to the other referents of the rounds the word occurs in. A
//! useful word scores targets clearly higher than distractors.

use std::{collections::BTreeMap, fmt};

use serde::Serialize;
use tangrams_data::SessionSet;
use tangrams_model::{ReferentScorer as _, ScoringError};
use tangrams_stats::mean::RunningMean;
use tangrams_training::WordModel;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordStats {
    pub word: String,
    /// Number of uses of the word across the scored rounds.
    pub occurrences: usize,
    pub target_score: Option<f64>,
    pub off_target_score: Option<f64>,
}

#[derive(Debug, Default)]
struct Accumulator {
    occurrences: usize,
    target: RunningMean,
    off_target: RunningMean,
}

/// Scores every referent against every in-vocabulary word of its round.
///
/// Rounds that fail validation are ignored. The result is sorted by word.
pub fn word_stats(model: &WordModel<'_>, set: &SessionSet) -> Result<Vec<WordStats>, ScoringError> {
    let scorer = model.scorer();
    let filter = model.params().word_filter();
    let mut accumulators = BTreeMap::<&str, Accumulator>::new();

    for round in set.rounds().filter(|round| round.validate().is_ok()) {
        for word in round.words(filter) {
            if !model.vocabulary().contains(word) {
                continue;
            }
            let accumulator = accumulators.entry(word).or_default();
            accumulator.occurrences += 1;
            for referent in &round.referents {
                let score = scorer.score(word, referent)?;
                if referent.is_target() {
                    accumulator.target.push(score);
                } else {
                    accumulator.off_target.push(score);
                }
            }
        }
    }

    Ok(accumulators
        .into_iter()
        .map(|(word, accumulator)| WordStats {
            word: word.to_owned(),
            occurrences: accumulator.occurrences,
            target_score: accumulator.target.value(),
            off_target_score: accumulator.off_target.value(),
        })
        .collect())
}

/// `word<TAB>target<TAB>off_target<TAB>occurrences`
impl fmt::Display for WordStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{:.3}\t{:.3}\t{}",
            self.word,
            self.target_score.unwrap_or(f64::NAN),
            self.off_target_score.unwrap_or(f64::NAN),
            self.occurrences
        )
    }
}

#[cfg(test)]
mod tests {
    use tangrams_data::synthetic::SyntheticCorpus;
    use tangrams_model::ModelParams;
    use tangrams_training::TrainingEngine;

    use super::*;

    #[test]
    fn test_color_words_prefer_targets() {
        let corpus = SyntheticCorpus {
            sessions: 4,
            rounds_per_session: 15,
            ..SyntheticCorpus::default()
        }
        .generate();
        let engine = TrainingEngine::new(ModelParams::default(), 2).unwrap();
        let model = WordModel::train(&engine, &corpus).unwrap();
        let stats = word_stats(&model, &corpus).unwrap();

        assert!(stats.windows(2).all(|w| w[0].word < w[1].word));
        assert!(stats.iter().all(|s| model.vocabulary().contains(&s.word)));
        let red = stats.iter().find(|s| s.word == "red").unwrap();
        assert!(red.target_score.unwrap() > red.off_target_score.unwrap());
        assert!(red.occurrences >= 3);
    }
}
