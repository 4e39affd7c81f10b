use crate::commands::{run_export, run_report, run_tables, ExportArgs, ReportArgs, TablesArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use jc_tracker::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "JC Tracker",
    about = "Extract, rank and compare weekly JC tracker status from the command line",
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
    /// List the weekly tables found in each quarter's document
    Tables(TablesArgs),
    /// Print status distribution, rankings and the report tables
    Report(ReportArgs),
    /// Write the extracted records as CSV
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Directory holding `<period>.html` or `<period>.json` documents
    #[arg(long)]
    pub(crate) documents_dir: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Tables(args) => run_tables(args),
        Command::Report(args) => run_report(args),
        Command::Export(args) => run_export(args),
    }
}
