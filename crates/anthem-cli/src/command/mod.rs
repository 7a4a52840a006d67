use clap::{Parser, Subcommand};

use self::{generate::GenerateArg, map::MapArg, prepare::PrepareArg, report::ReportArg};

mod generate;
mod map;
mod prepare;
mod report;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Derive entity features from raw fight-song rows
    Prepare(#[clap(flatten)] PrepareArg),
    /// Build and annotate the Mapper graph of an entity set
    Map(#[clap(flatten)] MapArg),
    /// Print a summary of a generated graph
    Report(#[clap(flatten)] ReportArg),
    /// Generate a synthetic entity set
    Generate(#[clap(flatten)] GenerateArg),
    /// Print the default Mapper configuration
    DefaultConfig,
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Prepare(arg) => prepare::run(&arg)?,
        Mode::Map(arg) => map::run(&arg)?,
        Mode::Report(arg) => report::run(&arg)?,
        Mode::Generate(arg) => generate::run(&arg)?,
        Mode::DefaultConfig => map::print_default_config()?,
    }
    Ok(())
}
