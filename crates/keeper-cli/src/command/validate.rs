use std::path::PathBuf;

use keeper_kpi::validation::DataQualityReport;

use crate::util::{self, Output};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ValidateArg {
    /// Frame table JSON file
    input: PathBuf,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ValidateArg) -> anyhow::Result<()> {
    let ValidateArg { input, output } = arg;
    let table = util::read_frame_table(input)?;
    let report = DataQualityReport::from_table(&table);
    if !report.missing_columns.is_empty() {
        log::warn!(
            "{} schema column(s) absent from {}",
            report.missing_columns.len(),
            input.display()
        );
    }
    Output::save_json(&report, output.clone())
}
