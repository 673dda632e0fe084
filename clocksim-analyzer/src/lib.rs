//! # clocksim-analyzer
//!
//! Offline reader for machine event logs. Parses every `machine_<id>.log`
//! in a directory and produces a per-machine and fleet-wide summary of
//! event counts, queue backlog and logical clock drift.

pub mod parse;
pub mod report;

use std::path::PathBuf;

use thiserror::Error;

pub use parse::{parse_log, LoggedEvent, MachineLog};
pub use report::{LogAnalyzer, MachineSummary, Report, REPORT_FILE_NAME};

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("Log I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No machine logs found in {0}")]
    NoLogs(PathBuf),
}
