//! # clocksim Telemetry
//!
//! Crate for diagnostic logging, the per-machine event log and metrics.

pub mod event_log;
pub mod logging;
pub mod metrics;

pub use event_log::FileEventLog;
pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
