//! Corpus records for the tangram reference game.
//!
//! A corpus is a [`SessionSet`]: one [`Session`] per recorded game, each an ordered list of
//! [`Round`]s. A round pairs the dialogue ([`Utterance`]s) with the candidate [`Referent`]s the
//! observer chose from, exactly one of which is the target.
//!
//! Records are constructed once by an external loader (or deserialized from JSON) and are
//! treated as immutable afterwards. Rounds are shared through [`Arc`](std::sync::Arc) so the
//! training pool and every cross-validation fold can reference them without copying.
//!
//! # Overview
//!
//! ```text
//! SessionSet
//! └─ sessions: Vec<Session>
//!     ├─ name
//!     └─ rounds: Vec<Arc<Round>>
//!         ├─ n (round number, >= 1)
//!         ├─ utterances: Vec<Utterance>   (speaker, giver flag, full text, referring text)
//!         └─ referents: Vec<Referent>     (shape, size, color, position, target flag)
//! ```
//!
//! Word extraction from a round is controlled by [`WordFilter`]; word counts over a set of
//! rounds are kept in a [`Vocabulary`]; the weighted rounds a model is trained on form a
//! [`TrainingPool`].
//!
//! The [`synthetic`] module generates seeded corpora for demos and tests.

pub use self::{
    filter::WordFilter,
    pool::{TrainingPool, WeightedRound},
    referent::Referent,
    round::{CorpusIntegrityError, Round},
    session::{Fold, Session, SessionSet},
    utterance::Utterance,
    vocabulary::{Vocabulary, VocabularyFileError},
};

pub mod filter;
pub mod pool;
pub mod referent;
pub mod round;
pub mod session;
pub mod synthetic;
pub mod utterance;
pub mod vocabulary;
