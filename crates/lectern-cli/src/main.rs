mod app;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lectern", version, about = "Live lecture capture and AI study notes")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Print pipeline diagnostics to stderr
    #[arg(long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Record a live lecture (the default)
    Record(commands::record::RecordArgs),
    /// List audio input devices
    Devices,
    /// Show or change configuration
    Config(commands::config::ConfigArgs),
    /// Interactive first-run setup
    Setup,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    lectern_core::set_verbose(cli.verbose);

    match cli.command {
        None => commands::record::run(commands::record::RecordArgs::default()).await,
        Some(Command::Record(args)) => commands::record::run(args).await,
        Some(Command::Devices) => commands::devices::run(),
        Some(Command::Config(args)) => commands::config::run(args),
        Some(Command::Setup) => commands::setup::run(),
    }
}
