//! Orchestrator: a fleet of machines on consecutive ports of one host,
//! every machine peered with every other.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{error, info, instrument, warn};
use validator::Validate;

use clocksim_config::{ConfigError, FleetConfig, MachineConfig, PeerEndpoint};
use clocksim_telemetry::FileEventLog;

use crate::error::MachineError;
use crate::machine::Machine;

pub struct Fleet {
    machines: Vec<Machine>,
}

impl Fleet {
    /// Machine ids start at 1; machine `i` listens on `base_port + i - 1`.
    /// Tick rates are drawn from the configured range.
    pub fn plan(config: &FleetConfig) -> Vec<MachineConfig> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let (low, high) = if config.tick_rate_min <= config.tick_rate_max {
            (config.tick_rate_min, config.tick_rate_max)
        } else {
            (config.tick_rate_max, config.tick_rate_min)
        };
        let ports: Vec<u16> = (0..config.machines)
            .map(|i| config.base_port.saturating_add(i as u16))
            .collect();

        ports
            .iter()
            .enumerate()
            .map(|(i, &port)| {
                let id = i as u32 + 1;
                let peers = ports
                    .iter()
                    .filter(|&&other| other != port)
                    .map(|&other| PeerEndpoint::new(config.address.clone(), other))
                    .collect();
                let tick_rate = rng.random_range(low..=high);

                let mut machine = MachineConfig::new(id, config.address.clone(), port, tick_rate)
                    .with_peers(peers)
                    .with_internal_event_probability(config.internal_event_probability)
                    .with_broadcast(config.broadcast)
                    .with_failed_send(config.failed_send);
                if let Some(seed) = config.seed {
                    machine = machine.with_seed(seed.wrapping_add(u64::from(id)));
                }
                machine
            })
            .collect()
    }

    /// Plans the fleet and opens each machine's event log in `log_dir`.
    pub fn new(config: &FleetConfig) -> Result<Self, MachineError> {
        config
            .validate()
            .map_err(|errors| ConfigError::validation("fleet", errors))?;
        let machines = Self::plan(config)
            .into_iter()
            .map(|machine| {
                let log = FileEventLog::create(&config.log_dir, machine.id, machine.tick_rate)?;
                Machine::new(machine, Arc::new(log))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_machines(machines))
    }

    pub fn from_machines(machines: Vec<Machine>) -> Self {
        Self { machines }
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    /// Starts every machine. If one fails, those already started are stopped
    /// and the error is returned.
    pub async fn start(&mut self) -> Result<(), MachineError> {
        for index in 0..self.machines.len() {
            let machine = &mut self.machines[index];
            info!(
                machine_id = machine.id(),
                port = machine.config().port,
                tick_rate = machine.config().tick_rate,
                "Starting machine"
            );
            if let Err(e) = machine.start().await {
                error!(machine_id = machine.id(), "Machine failed to start: {e}");
                for started in &mut self.machines[..index] {
                    if let Err(stop_error) = started.stop().await {
                        warn!(machine_id = started.id(), "Stop after failed start: {stop_error}");
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Stops every machine, reporting the first failure after all were tried.
    pub async fn stop(&mut self) -> Result<(), MachineError> {
        let mut first_error = None;
        for machine in &mut self.machines {
            if let Err(e) = machine.stop().await {
                warn!(machine_id = machine.id(), "Machine did not stop cleanly: {e}");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Starts the fleet, waits for `duration` or Ctrl-C, then stops it.
    #[instrument(skip(self), fields(machines = self.machines.len()))]
    pub async fn run_for(&mut self, duration: Duration) -> Result<(), MachineError> {
        self.start().await?;
        info!("Simulation running for {}s", duration.as_secs());

        tokio::select! {
            _ = tokio::time::sleep(duration) => info!("Simulation duration elapsed"),
            signal = tokio::signal::ctrl_c() => match signal {
                Ok(()) => info!("Received interrupt signal, shutting down"),
                Err(e) => warn!("Unable to listen for interrupt signal: {e}"),
            },
        }

        self.stop().await?;
        info!("All machines stopped");
        Ok(())
    }
}
