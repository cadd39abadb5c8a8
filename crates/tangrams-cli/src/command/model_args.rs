use std::path::PathBuf;

use tangrams_model::ModelParams;
use tangrams_training::TrainingEngine;

use crate::util;

/// Model parameters shared by every command that trains a model.
///
/// Values from `--params` are read first; flags given on the command line override them.
#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ModelArgs {
    /// JSON file with model parameters
    #[arg(long)]
    params: Option<PathBuf>,
    /// Disable ridge regularization
    #[arg(long)]
    no_ridge: bool,
    /// Ridge penalty strength
    #[arg(long)]
    ridge: Option<f64>,
    /// Minimum number of rounds a word must occur in to get its own classifier
    #[arg(long)]
    discount: Option<u32>,
    /// Only use words spoken by the giver
    #[arg(long)]
    only_giver: bool,
    /// Only use referring-language tokens
    #[arg(long)]
    only_reflang: bool,
    /// Weight word scores by log10 of their frequency
    #[arg(long)]
    weight_by_freq: bool,
    /// Weight word scores by their discriminative power
    #[arg(long)]
    weight_by_power: bool,
    /// Update the model with each evaluated round
    #[arg(long)]
    update_model: bool,
    /// Instance weight of rounds added by updates
    #[arg(long)]
    update_weight: Option<f64>,
    /// Words counted more often than this are not retrained by updates
    #[arg(long)]
    update_max_count: Option<u32>,
    /// Instance weight multiplier of target referents
    #[arg(long)]
    target_weight: Option<f64>,
    /// Number of training threads (0 = one per logical CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,
}

impl ModelArgs {
    pub(crate) fn model_params(&self) -> anyhow::Result<ModelParams> {
        let mut params = match &self.params {
            Some(path) => util::read_json_file("model parameters", path)?,
            None => ModelParams::default(),
        };
        if self.no_ridge {
            params.use_ridge = false;
        }
        if let Some(ridge) = self.ridge {
            params.ridge = ridge;
        }
        if let Some(discount) = self.discount {
            params.discount = discount;
        }
        params.only_giver |= self.only_giver;
        params.only_referring_language |= self.only_reflang;
        params.weight_by_freq |= self.weight_by_freq;
        params.weight_by_power |= self.weight_by_power;
        params.update_model |= self.update_model;
        if let Some(update_weight) = self.update_weight {
            params.update_weight = update_weight;
        }
        if let Some(update_max_count) = self.update_max_count {
            params.update_max_count = update_max_count;
        }
        if let Some(target_weight) = self.target_weight {
            params.target_weight = target_weight;
        }
        Ok(params)
    }

    pub(crate) fn engine(&self) -> anyhow::Result<TrainingEngine> {
        self.engine_with(self.model_params()?)
    }

    pub(crate) fn engine_with(&self, params: ModelParams) -> anyhow::Result<TrainingEngine> {
        Ok(TrainingEngine::new(params, self.threads)?)
    }
}
