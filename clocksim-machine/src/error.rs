use thiserror::Error;

use clocksim_config::ConfigError;
use clocksim_core::{ClockOverflow, SinkError, WireError};

#[derive(Debug, Error)]
pub enum MachineError {
    #[error("Invalid machine configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to bind listener on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workload distribution: {0}")]
    Workload(String),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Event log error: {0}")]
    Sink(#[from] SinkError),

    #[error("Machine is already running")]
    AlreadyRunning,

    #[error("Machine has been stopped and cannot be restarted")]
    AlreadyStopped,

    #[error("Machine task failed: {0}")]
    Task(String),
}

/// Outbound delivery failure. Logged, never propagated past the sender.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Failed to connect to {peer}: {source}")]
    Connect {
        peer: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to {peer}: {source}")]
    Write {
        peer: String,
        #[source]
        source: std::io::Error,
    },
}

/// A single inbound connection that produced no receive event.
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("Read failed: {0}")]
    Read(#[from] std::io::Error),

    #[error("Decode failed: {0}")]
    Decode(#[from] WireError),

    #[error(transparent)]
    Clock(#[from] ClockOverflow),
}
