use std::path::PathBuf;

use anyhow::Context as _;
use lifeline_model::service::SurvivalService;

use crate::util::{self, Output};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training records: a JSON array of objects, or one object per line
    file: PathBuf,
    /// Output file path for the training statistics
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(service: &SurvivalService, arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg { file, output } = arg;

    let records = util::read_records_file(file)?;
    tracing::info!(records = records.len(), path = %file.display(), "training records loaded");

    let stats = service
        .train(&records)
        .with_context(|| format!("Failed to train on {}", file.display()))?;
    Output::save_json(&stats, output.clone())?;
    Ok(())
}
