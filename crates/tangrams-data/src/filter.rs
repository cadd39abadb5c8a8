use serde::{Deserialize, Serialize};

/// Selects which tokens of a round count as its words.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordFilter {
    /// Only use utterances spoken by the giver (director).
    pub only_giver: bool,
    /// Use the referring-language tokens of an utterance instead of its full text.
    pub only_referring_language: bool,
}

impl WordFilter {
    pub const ALL: Self = Self {
        only_giver: false,
        only_referring_language: false,
    };
}
