use std::{io::Write as _, path::PathBuf, time::Instant};

use anyhow::Context as _;
use tangrams_evaluation::CrossValidator;
use tangrams_model::ModelParams;

use crate::{
    command::model_args::ModelArgs,
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct SweepArg {
    /// Corpus JSON file
    corpus: PathBuf,
    #[clap(flatten)]
    model: ModelArgs,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

fn with(base: &ModelParams, f: impl FnOnce(&mut ModelParams)) -> ModelParams {
    let mut params = base.clone();
    f(&mut params);
    params
}

/// The settings compared by a sweep, each derived from the base parameters.
///
/// The update runs build on the combined giver and referring-language filters.
fn settings(base: &ModelParams) -> Vec<ModelParams> {
    let filtered = with(base, |p| {
        p.only_giver = true;
        p.only_referring_language = true;
    });
    vec![
        base.clone(),
        with(base, |p| p.only_giver = true),
        with(base, |p| p.only_referring_language = true),
        filtered.clone(),
        with(&filtered, |p| {
            p.update_model = true;
            p.update_weight = 1.0;
        }),
        with(&filtered, |p| {
            p.update_model = true;
            p.update_weight = 5.0;
        }),
    ]
}

pub(crate) fn run(arg: &SweepArg) -> anyhow::Result<()> {
    let SweepArg {
        corpus,
        model,
        output,
    } = arg;

    let set = util::read_corpus_file(corpus)?;
    let base = model.model_params()?;

    let mut output = Output::from_output_path(output.clone())?;
    writeln!(
        output,
        "TIME\t{}\tMEAN_RANK\tMRR\tACCURACY",
        ModelParams::header()
    )
    .with_context(|| format!("Failed to write to {}", output.display_path()))?;

    for params in settings(&base) {
        let setting = params.setting();
        tracing::info!("cross-validating {setting}");
        let started = Instant::now();
        let engine = model.engine_with(params)?;
        let report = CrossValidator::new(&engine).cross_validate(&set);
        let elapsed = started.elapsed().as_secs_f64();
        writeln!(output, "{elapsed:.1}\t{setting}\t{}", report.summary)
            .with_context(|| format!("Failed to write to {}", output.display_path()))?;
        output.finish()?;
    }
    Ok(())
}
