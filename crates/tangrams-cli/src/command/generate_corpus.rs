use std::path::PathBuf;

use tangrams_data::synthetic::SyntheticCorpus;

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct GenerateCorpusArg {
    /// Number of sessions
    #[arg(long, default_value_t = 6)]
    sessions: usize,
    /// Number of rounds in each session
    #[arg(long, default_value_t = 20)]
    rounds_per_session: usize,
    /// Number of referents on the board in each round
    #[arg(long, default_value_t = 10)]
    referents_per_round: usize,
    /// Standard deviation of the noise added to colors
    #[arg(long, default_value_t = 0.05)]
    color_noise: f64,
    /// Random seed
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &GenerateCorpusArg) -> anyhow::Result<()> {
    let corpus = SyntheticCorpus {
        sessions: arg.sessions,
        rounds_per_session: arg.rounds_per_session,
        referents_per_round: arg.referents_per_round,
        color_noise: arg.color_noise,
        seed: arg.seed,
    };
    let set = corpus.generate();
    tracing::info!(
        "generated {} sessions of {} rounds",
        set.len(),
        corpus.rounds_per_session
    );
    Output::from_output_path(arg.output.clone())?.write_json(&set)
}
