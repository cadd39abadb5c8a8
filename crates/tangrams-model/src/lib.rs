//! The words-as-classifiers model.
//!
//! Every sufficiently frequent word of the game dialogues gets its own binary classifier that
//! estimates how well the word fits a referent, based on the referent's visual attributes.
//! A round is resolved by letting every word of its dialogue score every candidate referent
//! and ranking the candidates by their summed scores.
//!
//! # Building Blocks
//!
//! - [`feature`]: encodes a referent into a fixed-width numeric vector ([`FeatureSchema`])
//! - [`logistic`]: weighted, ridge-regularized logistic regression
//! - [`classifier`]: the immutable word → classifier store
//! - [`epoch`]: one immutable model state (schema, vocabulary, classifiers, training pool)
//! - [`scoring`]: per-word scores, aggregation and ranking
//! - [`params`]: the configuration shared by all of the above
//!
//! Training the classifiers in parallel and updating a model incrementally lives in the
//! `tangrams-training` crate.
//!
//! # Examples
//!
//! Fitting a classifier for the word "red" and using it to rank a round:
//!
//! ```
//! use std::sync::Arc;
//!
//! use tangrams_data::{Referent, Round, TrainingPool, Utterance, Vocabulary};
//! use tangrams_model::{
//!     FeatureSchema, ModelEpoch, ModelParams, ReferentScorer, WordClassifiers,
//!     logistic::{Example, LogisticRegression},
//! };
//!
//! let schema = FeatureSchema::new(["square"]);
//! let referents = [
//!     Referent::new(1, 1, "square").with_color(1.0, 0.0, 0.0).with_target(true),
//!     Referent::new(2, 1, "square").with_color(0.0, 0.0, 1.0),
//!     Referent::new(3, 1, "square").with_color(0.9, 0.1, 0.0).with_target(true),
//!     Referent::new(4, 1, "square").with_color(0.0, 1.0, 0.0),
//! ];
//! let features = referents
//!     .iter()
//!     .map(|r| schema.encode(r))
//!     .collect::<Result<Vec<_>, _>>()?;
//! let examples = features
//!     .iter()
//!     .zip(&referents)
//!     .map(|(features, r)| Example { features, target: r.is_target(), weight: 1.0 })
//!     .collect::<Vec<_>>();
//! let red = LogisticRegression::new(1.0).fit(&examples)?;
//!
//! let epoch = ModelEpoch {
//!     version: 0,
//!     schema,
//!     vocabulary: ["red"; 3].into_iter().collect::<Vocabulary>(),
//!     classifiers: [("red".to_owned(), Arc::new(red))].into_iter().collect::<WordClassifiers>(),
//!     discount: None,
//!     power: Default::default(),
//!     pool: TrainingPool::default(),
//!     failures: vec![],
//! };
//!
//! let round = Round::new(
//!     2,
//!     vec![Utterance::new("giver", true, ["the", "red", "one"])],
//!     vec![
//!         Referent::new(1, 2, "square").with_color(0.0, 1.0, 0.0),
//!         Referent::new(2, 2, "square").with_color(1.0, 0.1, 0.1).with_target(true),
//!     ],
//! );
//! let params = ModelParams::default();
//! assert_eq!(epoch.scorer(&params).target_rank(&round)?, 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{
    classifier::{TrainingFailure, WordClassifiers},
    epoch::ModelEpoch,
    feature::{FeatureSchema, FeatureVector, SchemaViolation},
    logistic::{LogisticClassifier, LogisticRegression},
    params::ModelParams,
    scoring::{EpochScorer, PredictionFailure, RankedReferent, ReferentScorer, ScoringError},
};

pub mod classifier;
pub mod epoch;
pub mod feature;
pub mod logistic;
pub mod params;
pub mod scoring;
