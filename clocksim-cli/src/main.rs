//! ## clocksim-cli
//! **Command-line front end**
//!
//! Runs a fleet of Lamport-clock machines on localhost and analyzes the
//! event logs they leave behind.

use clap::Parser;
use clocksim_telemetry::EventLogger;

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(&cli)?;
    EventLogger::init(&config.telemetry);

    match cli.command {
        Commands::Simulate(args) => commands::run_simulation(config, args).await,
        Commands::Analyze(args) => commands::run_analysis(config, args),
    }
}
