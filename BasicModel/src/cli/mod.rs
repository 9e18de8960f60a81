//! bmdl CLI - Command-line interface for exporting and inspecting BMF files

pub mod commands;

use clap::Parser;
use commands::Commands;
use tracing::Level;

#[derive(Parser)]
#[command(name = "bmdl")]
#[command(about = "bmdl: Basic Model Format exporter", long_about = None)]
struct Cli {
    /// Log pipeline details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Run the bmdl CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    cli.command.execute()?;

    Ok(())
}
