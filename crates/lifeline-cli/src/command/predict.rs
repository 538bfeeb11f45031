use std::path::PathBuf;

use anyhow::Context as _;
use lifeline_model::service::SurvivalService;

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct PredictArg {
    /// File containing one JSON record
    #[arg(conflicts_with = "json", required_unless_present = "json")]
    file: Option<PathBuf>,
    /// JSON record given inline
    #[arg(long)]
    json: Option<String>,
    /// Output file path for the prediction
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(service: &SurvivalService, arg: &PredictArg) -> anyhow::Result<()> {
    let PredictArg { file, json, output } = arg;

    let record = match (file, json) {
        (Some(path), _) => util::read_record_file(path)?,
        (None, Some(text)) => util::parse_record(text).context("Failed to parse --json record")?,
        (None, None) => anyhow::bail!("either a record file or --json must be given"),
    };

    let prediction = service.predict(&record).context("Prediction failed")?;
    Output::save_json(&prediction, output.clone())?;
    Ok(())
}
