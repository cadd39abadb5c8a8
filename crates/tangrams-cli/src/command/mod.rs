use clap::{Parser, Subcommand};

use self::{
    coefficients::CoefficientsArg, cross_validate::CrossValidateArg,
    generate_corpus::GenerateCorpusArg, sweep::SweepArg, vocabulary::VocabularyArg,
    word_analysis::WordAnalysisArg, word_stats::WordStatsArg,
};

mod coefficients;
mod cross_validate;
mod generate_corpus;
mod model_args;
mod sweep;
mod vocabulary;
mod word_analysis;
mod word_stats;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Leave-one-session-out cross-validation
    CrossValidate(#[clap(flatten)] CrossValidateArg),
    /// Cross-validate a fixed set of parameter settings
    Sweep(#[clap(flatten)] SweepArg),
    /// Print the vocabulary of a corpus
    Vocabulary(#[clap(flatten)] VocabularyArg),
    /// Print the large coefficients of each word classifier
    Coefficients(#[clap(flatten)] CoefficientsArg),
    /// Print how well each word picks out its targets
    WordStats(#[clap(flatten)] WordStatsArg),
    /// Print the count, discriminative power and combined weight of each word
    WordAnalysis(#[clap(flatten)] WordAnalysisArg),
    /// Generate a synthetic corpus
    GenerateCorpus(#[clap(flatten)] GenerateCorpusArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::CrossValidate(arg) => cross_validate::run(&arg)?,
        Mode::Sweep(arg) => sweep::run(&arg)?,
        Mode::Vocabulary(arg) => vocabulary::run(&arg)?,
        Mode::Coefficients(arg) => coefficients::run(&arg)?,
        Mode::WordStats(arg) => word_stats::run(&arg)?,
        Mode::WordAnalysis(arg) => word_analysis::run(&arg)?,
        Mode::GenerateCorpus(arg) => generate_corpus::run(&arg)?,
    }
    Ok(())
}
