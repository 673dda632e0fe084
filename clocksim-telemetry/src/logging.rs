//! ## clocksim-telemetry::logging
//! **Structured diagnostic logging with tracing**
//!
//! Diagnostic output (startup notices, connection trouble, decode failures)
//! goes through `tracing`. The clock event log lives in [`crate::event_log`].

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

use clocksim_config::TelemetryConfig;

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global subscriber. `RUST_LOG` overrides the configured level.
    pub fn init(config: &TelemetryConfig) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_lowercase()));

        let builder = fmt()
            .with_env_filter(filter)
            .with_thread_names(true)
            .with_span_events(FmtSpan::NONE);

        if config.json {
            builder.json().init()
        } else {
            builder.init()
        }
    }

    /// Notice for connection-level trouble that does not stop a machine.
    #[inline]
    pub fn log_connection_issue(machine_id: u32, peer: &str, error: &dyn std::fmt::Display) {
        tracing::info!(machine_id, peer, %error, "Connection issue");
    }
}
