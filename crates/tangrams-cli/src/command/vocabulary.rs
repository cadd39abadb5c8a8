use std::path::PathBuf;

use anyhow::Context as _;
use tangrams_data::TrainingPool;

use crate::{
    command::model_args::ModelArgs,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct VocabularyArg {
    /// Corpus JSON file
    corpus: PathBuf,
    #[clap(flatten)]
    model: ModelArgs,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &VocabularyArg) -> anyhow::Result<()> {
    let VocabularyArg {
        corpus,
        model,
        output,
    } = arg;

    let set = util::read_corpus_file(corpus)?;
    let params = model.model_params()?;
    let vocabulary =
        TrainingPool::from_sessions(&set).vocabulary(params.word_filter(), params.discount);
    tracing::info!(
        "{} words occur in at least {} rounds",
        vocabulary.len(),
        params.discount
    );

    let mut output = Output::from_output_path(output.clone())?;
    vocabulary
        .write_tsv(&mut output)
        .with_context(|| format!("Failed to write vocabulary to {}", output.display_path()))?;
    output.finish()
}
