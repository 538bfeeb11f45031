use std::path::PathBuf;

use lifeline_model::service::SurvivalService;

use crate::util::Output;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ModelInfoArg {
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(service: &SurvivalService, arg: &ModelInfoArg) -> anyhow::Result<()> {
    let info = service.model_info()?;
    Output::save_json(&info, arg.output.clone())?;
    Ok(())
}
