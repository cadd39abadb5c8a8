//! The per-word classifier store.

use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tangrams_data::Vocabulary;

use crate::logistic::{FitError, LogisticClassifier};

/// Label used in place of a word for the out-of-vocabulary classifier.
pub const OUT_OF_VOCABULARY: &str = "<oov>";

/// A classifier that could not be fitted.
///
/// Failures are isolated: the word is left without a dedicated classifier and every other
/// word trains normally.
#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, derive_more::Display, derive_more::Error,
)]
#[display("failed to train classifier for '{word}': {cause}")]
pub struct TrainingFailure {
    pub word: String,
    #[error(source)]
    pub cause: FitError,
}

/// Immutable mapping from word to its trained classifier.
///
/// Classifiers are shared through [`Arc`], so deriving an updated store from an existing one
/// copies pointers only. A store is never modified after construction; updates build a new
/// store with [`WordClassifiers::overlay`].
#[derive(Debug, Clone, Default)]
pub struct WordClassifiers {
    map: BTreeMap<String, Arc<LogisticClassifier>>,
}

impl WordClassifiers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, word: &str) -> Option<&LogisticClassifier> {
        self.map.get(word).map(AsRef::as_ref)
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.map.contains_key(word)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries in lexicographic word order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LogisticClassifier)> + '_ {
        self.map.iter().map(|(w, c)| (w.as_str(), c.as_ref()))
    }

    /// Returns a new store with `updates` replacing existing entries and every word missing
    /// from `vocabulary` dropped.
    #[must_use]
    pub fn overlay<I>(&self, updates: I, vocabulary: &Vocabulary) -> Self
    where
        I: IntoIterator<Item = (String, Arc<LogisticClassifier>)>,
    {
        let mut map = self.map.clone();
        map.extend(updates);
        map.retain(|word, _| vocabulary.contains(word));
        Self { map }
    }
}

impl FromIterator<(String, Arc<LogisticClassifier>)> for WordClassifiers {
    fn from_iter<T>(iter: T) -> Self
    where
        T: IntoIterator<Item = (String, Arc<LogisticClassifier>)>,
    {
        Self {
            map: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier(intercept: f64) -> Arc<LogisticClassifier> {
        Arc::new(LogisticClassifier {
            intercept,
            coefficients: vec![],
        })
    }

    #[test]
    fn test_overlay_replaces_and_retires() {
        let old = [
            ("blue".to_owned(), classifier(1.0)),
            ("red".to_owned(), classifier(2.0)),
            ("tiny".to_owned(), classifier(3.0)),
        ]
        .into_iter()
        .collect::<WordClassifiers>();
        let vocabulary = ["blue", "red", "green"].into_iter().collect::<Vocabulary>();

        let new = old.overlay(
            [
                ("red".to_owned(), classifier(20.0)),
                ("green".to_owned(), classifier(30.0)),
            ],
            &vocabulary,
        );

        assert_eq!(new.iter().map(|(w, _)| w).collect::<Vec<_>>(), ["blue", "green", "red"]);
        assert_eq!(new.get("red").unwrap().intercept, 20.0);
        assert_eq!(new.get("blue").unwrap().intercept, 1.0);
        assert!(!new.contains("tiny"));

        // the source store is untouched
        assert_eq!(old.get("red").unwrap().intercept, 2.0);
        assert!(old.contains("tiny"));
    }

    #[test]
    fn test_overlay_shares_unchanged_classifiers() {
        let blue = classifier(1.0);
        let old = [("blue".to_owned(), Arc::clone(&blue))]
            .into_iter()
            .collect::<WordClassifiers>();
        let vocabulary = ["blue"].into_iter().collect::<Vocabulary>();
        let new = old.overlay(std::iter::empty(), &vocabulary);
        assert!(std::ptr::eq(new.get("blue").unwrap(), blue.as_ref()));
    }

    #[test]
    fn test_training_failure_display() {
        let failure = TrainingFailure {
            word: "red".to_owned(),
            cause: FitError::SingleClass,
        };
        assert_eq!(
            failure.to_string(),
            "failed to train classifier for 'red': all weighted examples belong to one class"
        );
    }
}
