use clap::{Parser, Subcommand};

use self::{analyze::AnalyzeArg, validate::ValidateArg};

mod analyze;
mod validate;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug output (overrides `RUST_LOG`)
    #[arg(long, short, global = true)]
    verbose: bool,
    /// What mode to run the program in
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Compute goalkeeper KPIs over a frame table
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Report column presence and missing values of a frame table
    Validate(#[clap(flatten)] ValidateArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_logger(args.verbose);
    match args.mode {
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::Validate(arg) => validate::run(&arg)?,
    }
    Ok(())
}

fn init_logger(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}
