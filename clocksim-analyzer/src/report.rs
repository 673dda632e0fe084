//! Summary statistics and the text report written next to the logs.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use clocksim_core::EventKind;

use crate::parse::{machine_id_from_file_name, parse_log, MachineLog};
use crate::AnalyzerError;

pub const REPORT_FILE_NAME: &str = "analysis_report.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct MachineSummary {
    pub machine_id: u32,
    pub tick_rate: Option<u32>,
    pub total_events: usize,
    pub counts: BTreeMap<EventKind, usize>,
    /// Highest logical clock recorded; `None` for an empty log.
    pub final_clock: Option<u64>,
    pub average_queue_length: f64,
    pub max_queue_length: usize,
    pub connection_failures: usize,
}

impl MachineSummary {
    pub fn from_log(log: &MachineLog) -> Self {
        let mut counts = BTreeMap::new();
        for event in &log.events {
            *counts.entry(event.kind).or_insert(0) += 1;
        }
        let total_events = log.events.len();
        let queue_sum: usize = log.events.iter().map(|e| e.queue_length).sum();
        let average_queue_length = if total_events == 0 {
            0.0
        } else {
            queue_sum as f64 / total_events as f64
        };

        Self {
            machine_id: log.machine_id,
            tick_rate: log.tick_rate,
            total_events,
            counts,
            final_clock: log.events.iter().map(|e| e.logical_clock).max(),
            average_queue_length,
            max_queue_length: log.events.iter().map(|e| e.queue_length).max().unwrap_or(0),
            connection_failures: log.connection_failures,
        }
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub machines: Vec<MachineSummary>,
}

impl Report {
    /// `(machine id, clock)` of the most advanced machine.
    pub fn max_clock(&self) -> Option<(u32, u64)> {
        self.final_clocks().max_by_key(|&(id, clock)| (clock, std::cmp::Reverse(id)))
    }

    /// `(machine id, clock)` of the least advanced machine.
    pub fn min_clock(&self) -> Option<(u32, u64)> {
        self.final_clocks().min_by_key(|&(id, clock)| (clock, id))
    }

    /// Spread between the most and least advanced final clocks.
    pub fn drift(&self) -> Option<u64> {
        Some(self.max_clock()?.1 - self.min_clock()?.1)
    }

    fn final_clocks(&self) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.machines
            .iter()
            .filter_map(|m| m.final_clock.map(|clock| (m.machine_id, clock)))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(50);
        writeln!(f, "=== Distributed System Simulation Analysis ===")?;
        writeln!(f)?;
        writeln!(f, "Machine Statistics:")?;
        writeln!(f, "{rule}")?;
        for machine in &self.machines {
            writeln!(f, "Machine {}:", machine.machine_id)?;
            if let Some(rate) = machine.tick_rate {
                writeln!(f, "  Clock rate: {rate} ticks/second")?;
            }
            writeln!(f, "  Total events: {}", machine.total_events)?;
            for (kind, count) in &machine.counts {
                writeln!(f, "  {kind} events: {count}")?;
            }
            match machine.final_clock {
                Some(clock) => writeln!(f, "  Final logical clock value: {clock}")?,
                None => writeln!(f, "  Final logical clock value: n/a")?,
            }
            writeln!(f, "  Average queue length: {:.2}", machine.average_queue_length)?;
            writeln!(f, "  Maximum queue length: {}", machine.max_queue_length)?;
            writeln!(f, "  Failed connections: {}", machine.connection_failures)?;
            writeln!(f)?;
        }

        writeln!(f, "Global Observations:")?;
        writeln!(f, "{rule}")?;
        match (self.max_clock(), self.min_clock(), self.drift()) {
            (Some((max_id, max)), Some((min_id, min)), Some(drift)) => {
                writeln!(f, "Maximum logical clock: {max} (Machine {max_id})")?;
                writeln!(f, "Minimum logical clock: {min} (Machine {min_id})")?;
                writeln!(f, "Clock drift between machines: {drift}")?;
            }
            _ => writeln!(f, "No events recorded")?,
        }
        Ok(())
    }
}

pub struct LogAnalyzer {
    log_dir: PathBuf,
}

impl LogAnalyzer {
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Self {
        Self {
            log_dir: log_dir.as_ref().to_path_buf(),
        }
    }

    /// Reads every machine log in the directory, ordered by machine id.
    pub fn parse_logs(&self) -> Result<Vec<MachineLog>, AnalyzerError> {
        let mut logs = BTreeMap::new();
        for entry in fs::read_dir(&self.log_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(machine_id) = name.to_str().and_then(machine_id_from_file_name) else {
                continue;
            };
            let contents = fs::read_to_string(entry.path())?;
            let log = parse_log(machine_id, &contents);
            debug!(machine_id, events = log.events.len(), "Parsed machine log");
            logs.insert(machine_id, log);
        }

        if logs.is_empty() {
            return Err(AnalyzerError::NoLogs(self.log_dir.clone()));
        }
        Ok(logs.into_values().collect())
    }

    pub fn analyze(&self) -> Result<Report, AnalyzerError> {
        let machines = self
            .parse_logs()?
            .iter()
            .map(MachineSummary::from_log)
            .collect();
        Ok(Report { machines })
    }

    /// Analyzes the logs and writes the report into the log directory.
    pub fn write_report(&self) -> Result<(Report, PathBuf), AnalyzerError> {
        let report = self.analyze()?;
        let path = self.log_dir.join(REPORT_FILE_NAME);
        fs::write(&path, report.to_string())?;
        info!("Analysis report saved to {}", path.display());
        Ok((report, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_log(dir: &Path, id: u32, rows: &[&str]) {
        let mut contents = format!(
            "Machine {id} initialized with clock rate 2\n\nTime,Event,Queue Length,Logical Clock\n"
        );
        for row in rows {
            contents.push_str(row);
            contents.push('\n');
        }
        fs::write(dir.join(format!("machine_{id}.log")), contents).unwrap();
    }

    #[test]
    fn summarizes_each_machine_and_drift() {
        let dir = tempfile::tempdir().unwrap();
        write_log(
            dir.path(),
            1,
            &[
                "2025-02-03 14:05:09.000,internal,0,1",
                "2025-02-03 14:05:09.500,receive,1,8",
                "2025-02-03 14:05:10.000,receive,3,9",
                "2025-02-03 14:05:10.500,process,2,10",
            ],
        );
        write_log(
            dir.path(),
            2,
            &[
                "2025-02-03 14:05:09.100,internal,0,1",
                "CONN_LOG: 2025-02-03 14:05:09.200,127.0.0.1:5000,failed,refused",
                "2025-02-03 14:05:09.300,send,0,2",
            ],
        );
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let report = LogAnalyzer::new(dir.path()).analyze().unwrap();
        assert_eq!(report.machines.len(), 2);

        let first = &report.machines[0];
        assert_eq!(first.machine_id, 1);
        assert_eq!(first.total_events, 4);
        assert_eq!(first.count(EventKind::Receive), 2);
        assert_eq!(first.final_clock, Some(10));
        assert_eq!(first.max_queue_length, 3);
        assert!((first.average_queue_length - 1.5).abs() < 1e-9);

        let second = &report.machines[1];
        assert_eq!(second.count(EventKind::Send), 1);
        assert_eq!(second.connection_failures, 1);

        assert_eq!(report.max_clock(), Some((1, 10)));
        assert_eq!(report.min_clock(), Some((2, 2)));
        assert_eq!(report.drift(), Some(8));
    }

    #[test]
    fn writes_report_file() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path(), 1, &["2025-02-03 14:05:09.000,internal,0,1"]);

        let (_, path) = LogAnalyzer::new(dir.path()).write_report().unwrap();
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("=== Distributed System Simulation Analysis ==="));
        assert!(text.contains("Machine 1:"));
        assert!(text.contains("  internal events: 1"));
        assert!(text.contains("Clock drift between machines: 0"));
    }

    #[test]
    fn empty_logs_have_no_drift() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path(), 4, &[]);
        let report = LogAnalyzer::new(dir.path()).analyze().unwrap();
        assert_eq!(report.drift(), None);
        assert!(report.to_string().contains("No events recorded"));
    }

    #[test]
    fn missing_logs_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            LogAnalyzer::new(dir.path()).analyze(),
            Err(AnalyzerError::NoLogs(_))
        ));
    }
}
