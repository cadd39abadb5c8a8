use std::path::PathBuf;

use tangrams_evaluation::{CrossValidator, Progress, ValidationState};

use crate::{
    command::model_args::ModelArgs,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::FromStr)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CrossValidateArg {
    /// Corpus JSON file
    corpus: PathBuf,
    #[clap(flatten)]
    model: ModelArgs,
    /// Report format (text or json)
    #[arg(long, default_value = "text")]
    format: ReportFormat,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &CrossValidateArg) -> anyhow::Result<()> {
    let CrossValidateArg {
        corpus,
        model,
        format,
        output,
    } = arg;

    let set = util::read_corpus_file(corpus)?;
    let engine = model.engine()?;
    let mut validator =
        CrossValidator::new(&engine).with_progress_callback(Box::new(print_progress));
    let report = validator.cross_validate(&set);

    let mut output = Output::from_output_path(output.clone())?;
    match format {
        ReportFormat::Text => output.write_text(&report)?,
        ReportFormat::Json => output.write_json(&report)?,
    }
    Ok(())
}

fn print_progress(progress: &Progress<'_>) {
    let step = progress.fold + 1;
    let folds = progress.folds;
    match (progress.state, progress.session) {
        (ValidationState::Training, Some(session)) => {
            eprintln!("[{step}/{folds}] training without {session}");
        }
        (ValidationState::Evaluating, Some(session)) => {
            eprintln!("[{step}/{folds}] evaluating {session}");
        }
        (ValidationState::Aggregating, _) => eprintln!("aggregating {folds} folds"),
        _ => {}
    }
}
