//! Per-machine construction parameters.
//!
//! Everything a machine needs before `start()`: identity, bind endpoint,
//! tick rate, peers and the workload mix. Immutable once the machine is built.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

/// Address of another machine reachable for outbound sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct PeerEndpoint {
    #[validate(custom(function = validation::validate_host))]
    pub address: String,
    #[validate(range(min = 1))]
    pub port: u16,
}

impl PeerEndpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }
}

impl fmt::Display for PeerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}

/// How a "send to all peers" action advances the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastMode {
    /// One independent send per peer, in peer-list order. Each success
    /// increments the clock, so later peers see higher values.
    #[default]
    PerPeer,
    /// Every peer receives the same clock value; one increment and one
    /// `send` record if at least one peer accepted.
    Snapshot,
}

/// Clock effect of an outbound attempt that failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailedSendPolicy {
    /// Failed sends are invisible to the logical clock.
    #[default]
    NoOp,
    /// A failed attempt still counts as a send event.
    AdvanceClock,
}

fn default_internal_event_probability() -> f64 {
    0.7
}

fn default_read_buffer_size() -> usize {
    1024
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct MachineConfig {
    pub id: u32,

    #[validate(custom(function = validation::validate_host))]
    pub address: String,

    /// Listening port; 0 lets the OS pick one.
    pub port: u16,

    /// Ticks per second.
    #[validate(range(min = 1, max = 1000))]
    pub tick_rate: u32,

    #[serde(default)]
    #[validate(nested)]
    pub peers: Vec<PeerEndpoint>,

    #[serde(default = "default_internal_event_probability")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub internal_event_probability: f64,

    /// Upper bound of the single read performed per inbound connection.
    /// Must hold the longest message, `{"logical_clock":<20 digits>}` (39 bytes).
    #[serde(default = "default_read_buffer_size")]
    #[validate(range(min = 64, max = 65536))]
    pub read_buffer_size: usize,

    /// Seed for the workload RNG; random when absent.
    #[serde(default)]
    pub seed: Option<u64>,

    #[serde(default)]
    pub broadcast: BroadcastMode,

    #[serde(default)]
    pub failed_send: FailedSendPolicy,
}

impl MachineConfig {
    pub fn new(id: u32, address: impl Into<String>, port: u16, tick_rate: u32) -> Self {
        Self {
            id,
            address: address.into(),
            port,
            tick_rate,
            peers: Vec::new(),
            internal_event_probability: default_internal_event_probability(),
            read_buffer_size: default_read_buffer_size(),
            seed: None,
            broadcast: BroadcastMode::default(),
            failed_send: FailedSendPolicy::default(),
        }
    }

    pub fn with_peers(mut self, peers: Vec<PeerEndpoint>) -> Self {
        self.peers = peers;
        self
    }

    pub fn with_internal_event_probability(mut self, probability: f64) -> Self {
        self.internal_event_probability = probability;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_broadcast(mut self, mode: BroadcastMode) -> Self {
        self.broadcast = mode;
        self
    }

    pub fn with_failed_send(mut self, policy: FailedSendPolicy) -> Self {
        self.failed_send = policy;
        self
    }

    /// `address:port` to bind the listener to.
    pub fn bind_addr(&self) -> String {
        if self.address.contains(':') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }

    /// Sleep between ticks, `1 / tick_rate` seconds.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_legacy_workload() {
        let config = MachineConfig::new(1, "127.0.0.1", 5000, 2);
        assert_eq!(config.internal_event_probability, 0.7);
        assert_eq!(config.read_buffer_size, 1024);
        assert_eq!(config.broadcast, BroadcastMode::PerPeer);
        assert_eq!(config.failed_send, FailedSendPolicy::NoOp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn tick_period_is_inverse_of_rate() {
        let config = MachineConfig::new(1, "127.0.0.1", 0, 2);
        assert_eq!(config.tick_period(), Duration::from_millis(500));
    }

    #[test]
    fn rejects_zero_tick_rate() {
        let config = MachineConfig::new(1, "127.0.0.1", 0, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_probability_out_of_range() {
        let config = MachineConfig::new(1, "127.0.0.1", 0, 1).with_internal_event_probability(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn read_buffer_must_fit_the_longest_message() {
        let mut config = MachineConfig::new(1, "127.0.0.1", 0, 1);
        config.read_buffer_size = 16;
        assert!(config.validate().is_err());
        config.read_buffer_size = 64;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_peer() {
        let config = MachineConfig::new(1, "127.0.0.1", 0, 1)
            .with_peers(vec![PeerEndpoint::new("127.0.0.1", 0)]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn bind_addr_brackets_ipv6() {
        assert_eq!(MachineConfig::new(1, "127.0.0.1", 5000, 1).bind_addr(), "127.0.0.1:5000");
        assert_eq!(MachineConfig::new(1, "::1", 5000, 1).bind_addr(), "[::1]:5000");
    }

    #[test]
    fn peer_displays_as_socket_string() {
        assert_eq!(PeerEndpoint::new("10.0.0.2", 5002).to_string(), "10.0.0.2:5002");
    }
}
