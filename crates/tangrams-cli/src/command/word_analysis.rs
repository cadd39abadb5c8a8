use std::{
    collections::BTreeMap,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use tangrams_data::Vocabulary;
use tangrams_training::WordModel;

use crate::{
    command::model_args::ModelArgs,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct WordAnalysisArg {
    /// Corpus JSON file
    corpus: PathBuf,
    #[clap(flatten)]
    model: ModelArgs,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &WordAnalysisArg) -> anyhow::Result<()> {
    let WordAnalysisArg {
        corpus,
        model,
        output,
    } = arg;

    let set = util::read_corpus_file(corpus)?;
    let mut params = model.model_params()?;
    params.weight_by_freq = true;
    params.weight_by_power = true;
    let engine = model.engine_with(params)?;
    let word_model = WordModel::train(&engine, &set)?;
    let epoch = word_model.epoch();

    let mut output = Output::from_output_path(output.clone())?;
    write_word_analysis(&mut output, &epoch.vocabulary, &epoch.power)
        .with_context(|| format!("Failed to write word analysis to {}", output.display_path()))?;
    output.finish()
}

/// Writes `word, count, power, log10(count) * power` for every word with a trained classifier.
fn write_word_analysis<W>(
    mut writer: W,
    vocabulary: &Vocabulary,
    power: &BTreeMap<String, f64>,
) -> io::Result<()>
where
    W: Write,
{
    writeln!(writer, "WORD\tCOUNT\tPOWER\tWEIGHT")?;
    for (word, count) in vocabulary.iter() {
        let Some(&power) = power.get(word) else {
            tracing::debug!("'{word}' has no trained classifier");
            continue;
        };
        let weight = f64::from(count).log10() * power;
        writeln!(writer, "{word}\t{count}\t{power:.4}\t{weight:.4}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rows_combine_count_and_power() {
        let vocabulary = ["red"; 100]
            .into_iter()
            .chain(["blue"; 10])
            .chain(["one"; 3])
            .collect::<Vocabulary>();
        let power = [("blue".to_owned(), 0.25), ("red".to_owned(), 0.125)].into();
        let mut out = Vec::new();
        write_word_analysis(&mut out, &vocabulary, &power).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "WORD\tCOUNT\tPOWER\tWEIGHT\n\
             blue\t10\t0.2500\t0.2500\n\
             red\t100\t0.1250\t0.2500\n"
        );
    }
}
