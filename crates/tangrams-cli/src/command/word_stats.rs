use std::{io::Write as _, path::PathBuf};

use anyhow::Context as _;
use tangrams_evaluation::word_stats;
use tangrams_training::WordModel;

use crate::{
    command::model_args::ModelArgs,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct WordStatsArg {
    /// Corpus JSON file
    corpus: PathBuf,
    #[clap(flatten)]
    model: ModelArgs,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &WordStatsArg) -> anyhow::Result<()> {
    let WordStatsArg {
        corpus,
        model,
        output,
    } = arg;

    let set = util::read_corpus_file(corpus)?;
    let engine = model.engine()?;
    let word_model = WordModel::train(&engine, &set)?;
    let stats = word_stats(&word_model, &set)?;

    let mut output = Output::from_output_path(output.clone())?;
    writeln!(output, "WORD\tTARGET\tOFF_TARGET\tOCCURRENCES")
        .with_context(|| format!("Failed to write to {}", output.display_path()))?;
    for stat in &stats {
        writeln!(output, "{stat}")
            .with_context(|| format!("Failed to write to {}", output.display_path()))?;
    }
    output.finish()
}
