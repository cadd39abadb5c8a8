//! Leave-one-session-out cross-validation.
//!
//! Every session of a corpus is held out once. A fresh model is trained on the remaining
//! sessions and then used to rank the referents of every round of the held-out session:
//!
//! ```text
//!            ┌──────────────── for each session s ─────────────────┐
//!  Idle ──►  Training ──► Evaluating (rounds of s in order) ──────┘ ──► Aggregating ──► Idle
//!            (all − {s})   rank, update model (optional), restore
//! ```
//!
//! # Isolation
//!
//! - The held-out session never contributes to its own fold's training pool.
//! - With incremental updating enabled, the model learns from every evaluated round before
//!   the next round is scored. The pre-evaluation snapshot is restored afterwards, so no
//!   update leaks out of the session it was made in.
//! - All folds share one feature schema covering the shapes of the whole corpus, so a
//!   held-out session never contains an unknown shape.
//!
//! # Aggregation
//!
//! Each fold produces the mean rank, MRR and accuracy of its rounds. The overall result is
//! the unweighted mean of the fold means: sessions are the unit of evaluation, so a long
//! session does not outweigh a short one. Rounds that cannot be scored are skipped and
//! reported; folds whose model cannot be trained are reported and left out of the mean.

use std::{collections::BTreeMap, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tangrams_data::{CorpusIntegrityError, Round, Session, SessionSet};
use tangrams_model::{FeatureSchema, ModelParams, ScoringError, TrainingFailure};
use tangrams_stats::descriptive::DescriptiveStats;
use tangrams_training::{TrainError, TrainingEngine, WordModel};
use tracing::{info, warn};

use crate::result::RankResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValidationState {
    Idle,
    Training,
    Evaluating,
    Aggregating,
}

/// Reported to the progress callback on every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress<'a> {
    pub state: ValidationState,
    /// 0-based fold index (equal to `folds` while aggregating).
    pub fold: usize,
    pub folds: usize,
    /// The held-out session of the current fold.
    pub session: Option<&'a str>,
}

pub type ProgressCallback = Box<dyn Fn(&Progress<'_>) + Send + Sync>;

/// The outcome of ranking one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundEvaluation {
    pub round: i32,
    pub rank: usize,
    pub referents: usize,
    pub target_score: f64,
    /// Number of words that took part in the scoring.
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRound {
    pub round: i32,
    pub reason: String,
}

/// Results of evaluating every round of one session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvaluation {
    pub rounds: Vec<RoundEvaluation>,
    pub skipped_rounds: Vec<SkippedRound>,
    pub result: RankResult,
    /// Classifiers that failed while training or updating the model used for this session.
    pub training_failures: Vec<TrainingFailure>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FoldOutcome {
    Evaluated(SessionEvaluation),
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoldResult {
    pub index: usize,
    /// Name of the held-out session.
    pub session: String,
    pub training_sessions: Vec<String>,
    pub outcome: FoldOutcome,
}

impl FoldResult {
    #[must_use]
    pub fn evaluation(&self) -> Option<&SessionEvaluation> {
        match &self.outcome {
            FoldOutcome::Evaluated(evaluation) => Some(evaluation),
            FoldOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CrossValidationReport {
    pub params: ModelParams,
    pub started_at: DateTime<Utc>,
    pub folds: Vec<FoldResult>,
    /// Mean over the fold means.
    pub summary: RankResult,
    /// Every word that failed to train in any fold, with its first failure.
    pub training_failures: Vec<TrainingFailure>,
}

/// Tab-separated table: one row per fold, then the overall result and failed words.
impl fmt::Display for CrossValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SESSION\tROUNDS\tSKIPPED\tMEAN_RANK\tMRR\tACCURACY")?;
        for fold in &self.folds {
            match &fold.outcome {
                FoldOutcome::Evaluated(evaluation) => writeln!(
                    f,
                    "{}\t{}\t{}\t{}",
                    fold.session,
                    evaluation.rounds.len(),
                    evaluation.skipped_rounds.len(),
                    evaluation.result
                )?,
                FoldOutcome::Failed { error } => {
                    writeln!(f, "{}\t-\t-\tfailed: {error}", fold.session)?;
                }
            }
        }
        writeln!(f, "ALL\t{}\t-\t{}", self.summary.count(), self.summary)?;
        for failure in &self.training_failures {
            writeln!(f, "# {failure}")?;
        }
        Ok(())
    }
}

pub struct CrossValidator<'e> {
    engine: &'e TrainingEngine,
    state: ValidationState,
    progress_callback: Option<ProgressCallback>,
}

impl fmt::Debug for CrossValidator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CrossValidator")
            .field("engine", &self.engine)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'e> CrossValidator<'e> {
    #[must_use]
    pub fn new(engine: &'e TrainingEngine) -> Self {
        Self {
            engine,
            state: ValidationState::Idle,
            progress_callback: None,
        }
    }

    #[must_use]
    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    #[must_use]
    pub fn state(&self) -> ValidationState {
        self.state
    }

    #[must_use]
    pub fn params(&self) -> &ModelParams {
        self.engine.params()
    }

    pub fn cross_validate(&mut self, set: &SessionSet) -> CrossValidationReport {
        let started_at = Utc::now();
        let schema = FeatureSchema::new(set.shapes());
        let total = set.len();
        info!("Cross-validating {total} sessions");

        let mut folds = Vec::with_capacity(total);
        for fold in set.folds() {
            let session = fold.testing.name.as_str();
            self.transition(ValidationState::Training, fold.index, total, Some(session));
            info!(
                "Fold {}/{total}: holding out '{session}', training on {} sessions",
                fold.index + 1,
                fold.training.len()
            );

            let trained = WordModel::train_with_schema(self.engine, &fold.training, schema.clone());
            let outcome = match trained {
                Ok(mut model) => {
                    self.transition(ValidationState::Evaluating, fold.index, total, Some(session));
                    let evaluation = self.evaluate_session(&mut model, fold.testing);
                    info!("Fold {}/{total}: {}", fold.index + 1, evaluation.result);
                    FoldOutcome::Evaluated(evaluation)
                }
                Err(err) => {
                    warn!("Fold {}/{total}: model not trained: {err}", fold.index + 1);
                    FoldOutcome::Failed {
                        error: err.to_string(),
                    }
                }
            };

            folds.push(FoldResult {
                index: fold.index,
                session: session.to_owned(),
                training_sessions: fold
                    .training
                    .sessions
                    .iter()
                    .map(|s| s.name.clone())
                    .collect(),
                outcome,
            });
        }

        self.transition(ValidationState::Aggregating, total, total, None);
        let summary = folds
            .iter()
            .filter_map(FoldResult::evaluation)
            .map(|evaluation| &evaluation.result)
            .collect::<RankResult>();

        let mut training_failures = BTreeMap::new();
        for failure in folds
            .iter()
            .filter_map(FoldResult::evaluation)
            .flat_map(|evaluation| &evaluation.training_failures)
        {
            training_failures
                .entry(failure.word.clone())
                .or_insert_with(|| failure.clone());
        }
        info!("Cross-validation result: {summary}");
        let fold_mrrs = folds
            .iter()
            .filter_map(FoldResult::evaluation)
            .filter_map(|evaluation| evaluation.result.mrr());
        if let Some(spread) = DescriptiveStats::new(fold_mrrs) {
            info!(
                "Fold MRR: min {:.3}, median {:.3}, max {:.3}, sd {:.3}",
                spread.min, spread.median, spread.max, spread.sample_std_dev
            );
        }
        self.state = ValidationState::Idle;

        CrossValidationReport {
            params: self.engine.params().clone(),
            started_at,
            folds,
            summary,
            training_failures: training_failures.into_values().collect(),
        }
    }

    /// Trains on `training` and evaluates every session of `testing`.
    ///
    /// The result is the mean over the session means, as in cross-validation.
    pub fn validate(
        &mut self,
        training: &SessionSet,
        testing: &SessionSet,
    ) -> Result<RankResult, TrainError> {
        let schema = FeatureSchema::new(training.shapes().into_iter().chain(testing.shapes()));
        let total = testing.len();
        self.transition(ValidationState::Training, 0, total, None);
        let mut model = match WordModel::train_with_schema(self.engine, training, schema) {
            Ok(model) => model,
            Err(err) => {
                self.state = ValidationState::Idle;
                return Err(err);
            }
        };

        let mut result = RankResult::new();
        for (index, session) in testing.sessions.iter().enumerate() {
            self.transition(ValidationState::Evaluating, index, total, Some(&session.name));
            result.add_result(&self.evaluate_session(&mut model, session).result);
        }
        self.transition(ValidationState::Aggregating, total, total, None);
        self.state = ValidationState::Idle;
        Ok(result)
    }

    /// Ranks every round of `session` in order, updating the model after each round when
    /// enabled, and restores the model afterwards.
    pub fn evaluate_session(
        &self,
        model: &mut WordModel<'_>,
        session: &Session,
    ) -> SessionEvaluation {
        let snapshot = model.snapshot();
        let update = model.params().update_model;

        let mut rounds = vec![];
        let mut skipped_rounds = vec![];
        let mut result = RankResult::new();
        for round in &session.rounds {
            match evaluate_round(model, round) {
                Ok(evaluation) => {
                    result.add_rank(evaluation.rank);
                    rounds.push(evaluation);
                    if update && let Err(err) = model.update_model(Arc::clone(round)) {
                        warn!(
                            "Session '{}' round {}: model not updated: {err}",
                            session.name, round.n
                        );
                    }
                }
                Err(err) => {
                    warn!(
                        "Session '{}' round {} skipped: {err}",
                        session.name, round.n
                    );
                    skipped_rounds.push(SkippedRound {
                        round: round.n,
                        reason: err.to_string(),
                    });
                }
            }
        }

        let training_failures = model.failures().to_vec();
        model.restore(snapshot);
        SessionEvaluation {
            rounds,
            skipped_rounds,
            result,
            training_failures,
        }
    }

    fn transition(
        &mut self,
        state: ValidationState,
        fold: usize,
        folds: usize,
        session: Option<&str>,
    ) {
        self.state = state;
        if let Some(callback) = &self.progress_callback {
            callback(&Progress {
                state,
                fold,
                folds,
                session,
            });
        }
    }
}

fn evaluate_round(model: &WordModel<'_>, round: &Round) -> Result<RoundEvaluation, ScoringError> {
    let ranked = model.rank(round)?;
    let position = ranked
        .iter()
        .position(|r| r.referent.is_target())
        .ok_or(CorpusIntegrityError::MissingTarget { round: round.n })?;
    Ok(RoundEvaluation {
        round: round.n,
        rank: position + 1,
        referents: ranked.len(),
        target_score: ranked[position].score,
        word_count: round.words(model.params().word_filter()).count(),
    })
}
