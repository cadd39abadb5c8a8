use serde::{Deserialize, Serialize};

/// A single transcribed utterance of a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    /// Whether the speaker is the giver (director) in this round.
    pub is_giver: bool,
    /// Lower-cased tokens of the whole utterance.
    pub full_text: Vec<String>,
    /// Lower-cased tokens that belong to referring language.
    #[serde(default)]
    pub ref_text: Vec<String>,
}

impl Utterance {
    #[must_use]
    pub fn new<S, I, T>(speaker: S, is_giver: bool, full_text: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            speaker: speaker.into(),
            is_giver,
            full_text: full_text.into_iter().map(Into::into).collect(),
            ref_text: vec![],
        }
    }

    #[must_use]
    pub fn with_ref_text<I, T>(mut self, ref_text: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.ref_text = ref_text.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the utterance contains a negation ("no" or "nope").
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.full_text.iter().any(|w| w == "no" || w == "nope")
    }
}
