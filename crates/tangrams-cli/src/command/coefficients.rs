use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::Context as _;
use tangrams_model::{LogisticClassifier, ModelEpoch};
use tangrams_training::WordModel;

use crate::{
    command::model_args::ModelArgs,
    util::{self, Output},
};

const DISCOUNT_LABEL: &str = "<discount>";

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CoefficientsArg {
    /// Corpus JSON file
    corpus: PathBuf,
    #[clap(flatten)]
    model: ModelArgs,
    /// Only print coefficients whose magnitude exceeds this value
    #[arg(long, default_value_t = 4.0)]
    min_magnitude: f64,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &CoefficientsArg) -> anyhow::Result<()> {
    let CoefficientsArg {
        corpus,
        model,
        min_magnitude,
        output,
    } = arg;

    let set = util::read_corpus_file(corpus)?;
    let engine = model.engine()?;
    let word_model = WordModel::train(&engine, &set)?;

    let mut output = Output::from_output_path(output.clone())?;
    write_coefficients(&mut output, word_model.epoch(), *min_magnitude)
        .with_context(|| format!("Failed to write coefficients to {}", output.display_path()))?;
    output.finish()
}

fn write_coefficients<W>(mut writer: W, epoch: &ModelEpoch, min_magnitude: f64) -> io::Result<()>
where
    W: Write,
{
    let columns = epoch.schema.column_names();
    writeln!(writer, "WORD\tCOLUMN\tCOEFFICIENT")?;
    let discount = epoch
        .discount
        .as_deref()
        .map(|classifier| (DISCOUNT_LABEL, classifier));
    for (word, classifier) in epoch.classifiers.iter().chain(discount) {
        write_classifier(&mut writer, word, classifier, &columns, min_magnitude)?;
    }
    Ok(())
}

fn write_classifier<W>(
    mut writer: W,
    word: &str,
    classifier: &LogisticClassifier,
    columns: &[String],
    min_magnitude: f64,
) -> io::Result<()>
where
    W: Write,
{
    writeln!(writer, "{word}\t(intercept)\t{:.3}", classifier.intercept)?;
    for (column, coefficient) in columns.iter().zip(&classifier.coefficients) {
        if coefficient.abs() > min_magnitude {
            writeln!(writer, "{word}\t{column}\t{coefficient:.3}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_large_coefficients_are_written() {
        let classifier = LogisticClassifier {
            intercept: -1.0,
            coefficients: vec![0.5, -6.0, 4.5],
        };
        let columns = ["a", "b", "c"].map(String::from);
        let mut out = Vec::new();
        write_classifier(&mut out, "red", &classifier, &columns, 4.0).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "red\t(intercept)\t-1.000\nred\tb\t-6.000\nred\tc\t4.500\n"
        );
    }
}
