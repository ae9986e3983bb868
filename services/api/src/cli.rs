use crate::commands::{run_analytics, run_predict, run_train, AnalyticsArgs, PredictArgs, TrainArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dropout_forecast::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Dropout Forecast",
    about = "Train, query and serve the municipal school dropout forecaster",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Prepare a municipal CSV export and fit a new model artifact
    Train(TrainArgs),
    /// Forecast one municipality, optionally with scenario adjustments
    Predict(PredictArgs),
    /// Print population-weighted dashboard figures
    Analytics(AnalyticsArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured model artifact path
    #[arg(long)]
    pub(crate) model: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Train(args) => run_train(args),
        Command::Predict(args) => run_predict(args),
        Command::Analytics(args) => run_analytics(args),
    }
}
