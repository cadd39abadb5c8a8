//! Training and incremental updating of words-as-classifiers models.
//!
//! - [`engine`]: fits one classifier per word on a bounded thread pool and collects the
//!   results once every job has finished
//! - [`model`]: the live [`WordModel`], its incremental updates and snapshot/restore
//!
//! # Examples
//!
//! ```
//! use tangrams_data::synthetic::SyntheticCorpus;
//! use tangrams_model::ModelParams;
//! use tangrams_training::{TrainingEngine, WordModel};
//!
//! let corpus = SyntheticCorpus { sessions: 2, rounds_per_session: 8, ..Default::default() }
//!     .generate();
//! let engine = TrainingEngine::new(ModelParams::default(), 2)?;
//! let mut model = WordModel::train(&engine, &corpus)?;
//!
//! let snapshot = model.snapshot();
//! model.update_model(corpus.sessions[0].rounds[0].clone())?;
//! assert_eq!(model.epoch().version, 1);
//!
//! model.restore(snapshot);
//! assert_eq!(model.epoch().version, 0);
//!
//! let round = &corpus.sessions[1].rounds[0];
//! let rank = model.target_rank(round)?;
//! assert!(rank >= 1 && rank <= round.referents.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use self::{
    engine::{EngineError, TrainingBatch, TrainingEngine},
    model::{ModelSnapshot, TrainError, WordModel},
};

pub mod engine;
pub mod model;
