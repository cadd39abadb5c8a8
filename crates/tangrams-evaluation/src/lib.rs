//! Evaluation of words-as-classifiers models.
//!
//! - [`cross_validation`]: leave-one-session-out cross-validation with optional incremental
//!   updating, and train/test validation on separate corpora
//! - [`result`]: mean rank, mean reciprocal rank and accuracy@1
//! - [`word_stats`]: per-word target vs. distractor scores of a trained model

pub use self::{
    cross_validation::{
        CrossValidationReport, CrossValidator, FoldOutcome, FoldResult, Progress,
        ProgressCallback, RoundEvaluation, SessionEvaluation, SkippedRound, ValidationState,
    },
    result::RankResult,
    word_stats::{WordStats, word_stats},
};

pub mod cross_validation;
pub mod result;
pub mod word_stats;
