use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lifeline_model::{
    service::SurvivalService,
    store::{ModelStore, StoreConfig},
};
use tracing_subscriber::EnvFilter;

use self::{model_info::ModelInfoArg, predict::PredictArg, train::TrainArg};

mod model_info;
mod predict;
mod train;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Directory holding the persisted model
    #[arg(
        long,
        global = true,
        env = "LIFELINE_MODEL_DIR",
        default_value = StoreConfig::DEFAULT_ROOT
    )]
    model_dir: PathBuf,
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Train a model from labelled records
    Train(#[clap(flatten)] TrainArg),
    /// Predict survival for one record
    Predict(#[clap(flatten)] PredictArg),
    /// Show the current model
    ModelInfo(#[clap(flatten)] ModelInfoArg),
}

pub fn run() -> anyhow::Result<()> {
    init_tracing();
    let args = CommandArgs::parse();
    let service = SurvivalService::new(ModelStore::new(StoreConfig::new(args.model_dir)));
    match args.mode {
        Mode::Train(arg) => train::run(&service, &arg)?,
        Mode::Predict(arg) => predict::run(&service, &arg)?,
        Mode::ModelInfo(arg) => model_info::run(&service, &arg)?,
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
