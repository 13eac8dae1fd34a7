//! Dashboard smoke test - end-to-end check of an event server and its live dashboard
//!
//! Verifies that an event posted to the server shows up, payload intact, in
//! the dashboard rendered by a headless browser. Exits 0 when every step
//! passes and 1 on the first failure.

use clap::Parser;
use dashboard_smoke::commands::Commands;
use dashboard_smoke::common::{config::Config, logging};
use dashboard_smoke::cli;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dashboard-smoke", about = "End-to-end smoke test for an event dashboard")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Run { verbose: true, .. });
    logging::init_cli(verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    let result = match config {
        Ok(config) => cli::dispatch_guarded(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        if let Some(hint) = cli::failure_hint(&e) {
            eprintln!("  {hint}");
        }
        std::process::exit(1);
    }
}
