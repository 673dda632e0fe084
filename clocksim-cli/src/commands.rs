use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use validator::Validate;

use clocksim_analyzer::LogAnalyzer;
use clocksim_config::{BroadcastMode, ClocksimConfig, ConfigError, FailedSendPolicy};
use clocksim_machine::Fleet;

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    /// Configuration file to load instead of `config/clocksim.yaml`.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a fleet of machines until the duration elapses or Ctrl-C
    Simulate(SimulateArgs),
    /// Summarize the machine logs in a directory
    Analyze(AnalyzeArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct SimulateArgs {
    #[arg(short, long)]
    pub machines: Option<usize>,
    #[arg(long)]
    pub base_port: Option<u16>,
    /// Run time in seconds
    #[arg(short, long)]
    pub duration: Option<u64>,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub internal_probability: Option<f64>,
    #[arg(long)]
    pub tick_rate_min: Option<u32>,
    #[arg(long)]
    pub tick_rate_max: Option<u32>,
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub broadcast: Option<BroadcastArg>,
    #[arg(long, value_enum)]
    pub failed_send: Option<FailedSendArg>,
    /// Print each machine's Prometheus metrics after the run
    #[arg(long)]
    pub metrics: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct AnalyzeArgs {
    /// Directory holding `machine_<id>.log` files; defaults to the fleet log dir
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BroadcastArg {
    PerPeer,
    Snapshot,
}

impl From<BroadcastArg> for BroadcastMode {
    fn from(arg: BroadcastArg) -> Self {
        match arg {
            BroadcastArg::PerPeer => BroadcastMode::PerPeer,
            BroadcastArg::Snapshot => BroadcastMode::Snapshot,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailedSendArg {
    NoOp,
    AdvanceClock,
}

impl From<FailedSendArg> for FailedSendPolicy {
    fn from(arg: FailedSendArg) -> Self {
        match arg {
            FailedSendArg::NoOp => FailedSendPolicy::NoOp,
            FailedSendArg::AdvanceClock => FailedSendPolicy::AdvanceClock,
        }
    }
}

pub fn load_config(cli: &Cli) -> Result<ClocksimConfig, ConfigError> {
    match &cli.config {
        Some(path) => ClocksimConfig::load_from_path(path),
        None => ClocksimConfig::load(),
    }
}

/// Command-line flags win over every file and environment layer.
fn apply_overrides(config: &mut ClocksimConfig, args: &SimulateArgs) -> Result<(), ConfigError> {
    let fleet = &mut config.fleet;
    if let Some(machines) = args.machines {
        fleet.machines = machines;
    }
    if let Some(port) = args.base_port {
        fleet.base_port = port;
    }
    if let Some(secs) = args.duration {
        fleet.duration_secs = secs;
    }
    if args.seed.is_some() {
        fleet.seed = args.seed;
    }
    if let Some(p) = args.internal_probability {
        fleet.internal_event_probability = p;
    }
    if let Some(min) = args.tick_rate_min {
        fleet.tick_rate_min = min;
    }
    if let Some(max) = args.tick_rate_max {
        fleet.tick_rate_max = max;
    }
    if let Some(dir) = &args.log_dir {
        fleet.log_dir = dir.clone();
    }
    if let Some(mode) = args.broadcast {
        fleet.broadcast = mode.into();
    }
    if let Some(policy) = args.failed_send {
        fleet.failed_send = policy.into();
    }
    config
        .validate()
        .map_err(|errors| ConfigError::validation("simulate", errors))
}

pub async fn run_simulation(mut config: ClocksimConfig, args: SimulateArgs) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args)?;
    let fleet_config = &config.fleet;

    let mut fleet = Fleet::new(fleet_config).context("Failed to set up the fleet")?;
    fleet.run_for(fleet_config.duration()).await?;

    for machine in fleet.machines() {
        info!(
            machine_id = machine.id(),
            logical_clock = machine.clock(),
            queue_length = machine.inbox_len(),
            "Final machine state"
        );
        if args.metrics {
            println!("{}", machine.metrics().gather_metrics()?);
        }
    }
    info!("Event logs written to {}", fleet_config.log_dir.display());
    Ok(())
}

pub fn run_analysis(config: ClocksimConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let log_dir = args.log_dir.unwrap_or(config.fleet.log_dir);
    let (report, path) = LogAnalyzer::new(&log_dir)
        .write_report()
        .with_context(|| format!("Failed to analyze logs in {}", log_dir.display()))?;
    print!("{report}");
    info!("Report written to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simulate_flags() {
        let cli = Cli::parse_from([
            "clocksim",
            "simulate",
            "--machines",
            "4",
            "--broadcast",
            "snapshot",
            "--failed-send",
            "advance-clock",
            "--metrics",
        ]);
        let Commands::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.machines, Some(4));
        assert_eq!(args.broadcast, Some(BroadcastArg::Snapshot));
        assert_eq!(args.failed_send, Some(FailedSendArg::AdvanceClock));
        assert!(args.metrics);
    }

    #[test]
    fn overrides_replace_loaded_values() {
        let mut config = ClocksimConfig::default();
        let args = SimulateArgs {
            machines: Some(5),
            seed: Some(9),
            broadcast: Some(BroadcastArg::Snapshot),
            ..Default::default()
        };
        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(config.fleet.machines, 5);
        assert_eq!(config.fleet.seed, Some(9));
        assert_eq!(config.fleet.broadcast, BroadcastMode::Snapshot);
        assert_eq!(config.fleet.base_port, 5000);
    }

    #[test]
    fn invalid_override_is_rejected() {
        let mut config = ClocksimConfig::default();
        let args = SimulateArgs {
            tick_rate_min: Some(9),
            tick_rate_max: Some(2),
            ..Default::default()
        };
        assert!(matches!(
            apply_overrides(&mut config, &args),
            Err(ConfigError::Validation { .. })
        ));
    }
}
