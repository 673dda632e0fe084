//! Orchestrator parameters for a fleet of machines on one host.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::machine::{BroadcastMode, FailedSendPolicy};
use crate::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = validation::validate_fleet))]
pub struct FleetConfig {
    /// Number of machines to run.
    #[validate(range(min = 1, max = 64))]
    pub machines: usize,

    /// Address every machine binds to and is reached on.
    #[validate(custom(function = validation::validate_host))]
    pub address: String,

    /// Machine `i` (0-based) listens on `base_port + i`.
    #[validate(range(min = 1))]
    pub base_port: u16,

    /// Tick rates are drawn uniformly from `[tick_rate_min, tick_rate_max]`.
    #[validate(range(min = 1, max = 1000))]
    pub tick_rate_min: u32,
    #[validate(range(min = 1, max = 1000))]
    pub tick_rate_max: u32,

    #[validate(range(min = 0.0, max = 1.0))]
    pub internal_event_probability: f64,

    /// Wall-clock run time of `simulate`.
    #[validate(range(min = 1))]
    pub duration_secs: u64,

    /// Seeds tick-rate selection and, derived per machine, each workload RNG.
    pub seed: Option<u64>,

    pub broadcast: BroadcastMode,

    pub failed_send: FailedSendPolicy,

    /// Directory receiving `machine_<id>.log` files.
    pub log_dir: PathBuf,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            machines: 3,
            address: "127.0.0.1".into(),
            base_port: 5000,
            tick_rate_min: 1,
            tick_rate_max: 6,
            internal_event_probability: 0.7,
            duration_secs: 60,
            seed: None,
            broadcast: BroadcastMode::default(),
            failed_send: FailedSendPolicy::default(),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl FleetConfig {
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}
