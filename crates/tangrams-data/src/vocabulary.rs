//! Word frequency tables.
//!
//! A [`Vocabulary`] maps each word to an occurrence count. Training uses the pruned
//! vocabulary of its training pool to decide which words get a dedicated classifier, and
//! incremental updates use [`Vocabulary::updated_words_since`] to retrain only the words
//! whose counts changed.
//!
//! Enumeration order is always deterministic: [`Vocabulary::words`] is lexicographic and
//! [`Vocabulary::words_sorted_by_freq`] breaks count ties lexicographically.
//!
//! # File format
//!
//! Vocabularies persist as tab-separated `word<TAB>count` lines, most frequent first:
//!
//! ```
//! use tangrams_data::Vocabulary;
//!
//! let mut vocab = Vocabulary::new();
//! for word in ["red", "blue", "red"] {
//!     vocab.add(word);
//! }
//! let mut out = Vec::new();
//! vocab.write_tsv(&mut out).unwrap();
//! assert_eq!(String::from_utf8(out).unwrap(), "red\t2\nblue\t1\n");
//! ```

use std::{
    collections::BTreeMap,
    fmt,
    io::{self, BufRead, Write},
};

/// Suffix marking a truncated or disfluent token in the transcriptions.
pub const TRUNCATION_MARKER: char = '-';

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum VocabularyFileError {
    #[display("failed to read vocabulary file")]
    Io(io::Error),
    #[display("malformed vocabulary line {line}: {reason}")]
    Malformed { line: usize, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    counts: BTreeMap<String, u32>,
}

impl Vocabulary {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count of `word`, starting at 1 if absent.
    pub fn add(&mut self, word: &str) {
        if let Some(count) = self.counts.get_mut(word) {
            *count += 1;
        } else {
            self.counts.insert(word.to_owned(), 1);
        }
    }

    /// Removes every word seen fewer than `min_count` times or ending in the truncation marker.
    pub fn prune(&mut self, min_count: u32) {
        self.counts
            .retain(|word, count| *count >= min_count && !word.ends_with(TRUNCATION_MARKER));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.counts.contains_key(word)
    }

    #[must_use]
    pub fn count(&self, word: &str) -> Option<u32> {
        self.counts.get(word).copied()
    }

    /// Count of `word`, or `default` if the word is not in the vocabulary.
    #[must_use]
    pub fn count_or(&self, word: &str, default: u32) -> u32 {
        self.count(word).unwrap_or(default)
    }

    /// All words in lexicographic order.
    pub fn words(&self) -> impl Iterator<Item = &str> + '_ {
        self.counts.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> + '_ {
        self.counts.iter().map(|(w, c)| (w.as_str(), *c))
    }

    /// Words by descending count; equal counts are ordered lexicographically.
    #[must_use]
    pub fn words_sorted_by_freq(&self) -> Vec<&str> {
        let mut entries = self.iter().collect::<Vec<_>>();
        // `iter` is already lexicographic and the sort is stable
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.into_iter().map(|(w, _)| w).collect()
    }

    /// Words that need retraining after the vocabulary grew from `old`.
    ///
    /// A word is returned if it is new, or if its count changed while its old count was at
    /// most `threshold` (frequent words are stable enough not to be retrained). Words whose
    /// count did not change are never returned.
    #[must_use]
    pub fn updated_words_since(&self, old: &Vocabulary, threshold: u32) -> Vec<String> {
        self.iter()
            .filter(|(word, count)| match old.count(word) {
                None => true,
                Some(old_count) => old_count <= threshold && old_count != *count,
            })
            .map(|(word, _)| word.to_owned())
            .collect()
    }

    /// Writes `word<TAB>count` lines, most frequent first.
    pub fn write_tsv<W>(&self, mut writer: W) -> io::Result<()>
    where
        W: Write,
    {
        for word in self.words_sorted_by_freq() {
            writeln!(writer, "{word}\t{}", self.counts[word])?;
        }
        Ok(())
    }

    /// Reads `word<TAB>count` lines; blank lines are skipped.
    pub fn read_tsv<R>(reader: R) -> Result<Self, VocabularyFileError>
    where
        R: BufRead,
    {
        let mut counts = BTreeMap::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line.map_err(VocabularyFileError::Io)?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let malformed = |reason: String| VocabularyFileError::Malformed {
                line: i + 1,
                reason,
            };
            let (word, count) = line
                .split_once('\t')
                .ok_or_else(|| malformed("expected `word<TAB>count`".to_owned()))?;
            let count = count
                .trim()
                .parse::<u32>()
                .map_err(|e| malformed(format!("invalid count {count:?}: {e}")))?;
            counts.insert(word.to_owned(), count);
        }
        Ok(Self { counts })
    }
}

impl<'a> FromIterator<&'a str> for Vocabulary {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        let mut vocab = Self::new();
        for word in iter {
            vocab.add(word);
        }
        vocab
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.words_sorted_by_freq() {
            writeln!(f, "{word} {}", self.counts[word])?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn vocab(words: &[&str]) -> Vocabulary {
        words.iter().copied().collect()
    }

    #[test]
    fn test_add_counts() {
        let v = vocab(&["a", "b", "a", "a"]);
        assert_eq!(v.count("a"), Some(3));
        assert_eq!(v.count("b"), Some(1));
        assert_eq!(v.count("c"), None);
        assert_eq!(v.count_or("c", 3), 3);
    }

    #[test]
    fn test_prune_is_monotone() {
        let mut v = vocab(&[
            "red", "red", "red", "blue", "blue", "gre-", "gre-", "gre-", "the", "the", "the", "the",
        ]);
        v.prune(3);
        assert_eq!(v.words().collect::<Vec<_>>(), ["red", "the"]);
        for (word, count) in v.iter() {
            assert!(count >= 3);
            assert!(!word.ends_with(TRUNCATION_MARKER));
        }
    }

    #[test]
    fn test_sorted_by_freq_breaks_ties_lexicographically() {
        let v = vocab(&["b", "c", "a", "c", "d", "d"]);
        assert_eq!(v.words_sorted_by_freq(), ["c", "d", "a", "b"]);
    }

    #[test]
    fn test_updated_words_since() {
        let old = vocab(&["same", "grew", "big", "big", "big"]);
        let new = vocab(&["same", "grew", "grew", "big", "big", "big", "big", "fresh"]);
        assert_eq!(new.updated_words_since(&old, 200), ["big", "fresh", "grew"]);
        // "big" had 3 occurrences before, above the threshold of 2
        assert_eq!(new.updated_words_since(&old, 2), ["fresh", "grew"]);
        assert!(old.updated_words_since(&old, 200).is_empty());
    }

    #[test]
    fn test_tsv_round_trip() {
        let v = vocab(&["red", "blue", "red", "the", "the", "the"]);
        let mut out = Vec::new();
        v.write_tsv(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "the\t3\nred\t2\nblue\t1\n");
        let read = Vocabulary::read_tsv(Cursor::new(text)).unwrap();
        assert_eq!(read, v);
    }

    #[test]
    fn test_read_tsv_reports_line() {
        let err = Vocabulary::read_tsv(Cursor::new("red\t2\n\nblue\tmany\n")).unwrap_err();
        assert!(matches!(err, VocabularyFileError::Malformed { line: 3, .. }));
        let err = Vocabulary::read_tsv(Cursor::new("red 2\n")).unwrap_err();
        assert!(matches!(err, VocabularyFileError::Malformed { line: 1, .. }));
    }
}
