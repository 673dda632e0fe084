//! Event log parsing.
//!
//! Everything before the CSV header is ignored, as are `CONN_LOG:` lines
//! (only counted) and rows that do not parse (reported at `warn`).

use chrono::NaiveDateTime;
use tracing::warn;

use clocksim_core::events::{CONN_LOG_PREFIX, CSV_HEADER};
use clocksim_core::EventKind;

const TIMESTAMP_PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Debug, Clone, PartialEq)]
pub struct LoggedEvent {
    pub timestamp: NaiveDateTime,
    pub kind: EventKind,
    pub queue_length: usize,
    pub logical_clock: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MachineLog {
    pub machine_id: u32,
    /// From the `... initialized with clock rate N` header, when present.
    pub tick_rate: Option<u32>,
    pub events: Vec<LoggedEvent>,
    pub connection_successes: usize,
    pub connection_failures: usize,
    pub skipped_lines: usize,
}

/// `machine_<id>.log` -> `id`
pub fn machine_id_from_file_name(name: &str) -> Option<u32> {
    name.strip_prefix("machine_")?
        .strip_suffix(".log")?
        .parse()
        .ok()
}

pub fn parse_log(machine_id: u32, contents: &str) -> MachineLog {
    let mut log = MachineLog {
        machine_id,
        ..MachineLog::default()
    };

    let mut lines = contents.lines();
    for line in lines.by_ref() {
        let line = line.trim();
        if line == CSV_HEADER {
            break;
        }
        if let Some(rate) = line
            .rsplit_once("clock rate ")
            .and_then(|(_, rate)| rate.trim().parse().ok())
        {
            log.tick_rate = Some(rate);
        }
    }

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(status) = line.strip_prefix(CONN_LOG_PREFIX) {
            match status.split(',').nth(2).map(str::trim) {
                Some("success") => log.connection_successes += 1,
                Some("failed") => log.connection_failures += 1,
                _ => log.skipped_lines += 1,
            }
            continue;
        }
        match parse_row(line) {
            Some(event) => log.events.push(event),
            None => {
                warn!(machine_id, "Skipping unparseable log line: {line}");
                log.skipped_lines += 1;
            }
        }
    }
    log
}

fn parse_row(line: &str) -> Option<LoggedEvent> {
    let mut parts = line.split(',');
    let (timestamp, kind, queue_length, logical_clock) =
        (parts.next()?, parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    Some(LoggedEvent {
        timestamp: NaiveDateTime::parse_from_str(timestamp.trim(), TIMESTAMP_PARSE_FORMAT).ok()?,
        kind: kind.trim().parse().ok()?,
        queue_length: queue_length.trim().parse().ok()?,
        logical_clock: logical_clock.trim().parse().ok()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Machine 3 initialized with clock rate 4

Time,Event,Queue Length,Logical Clock
2025-02-03 14:05:09.042,internal,0,1
CONN_LOG: 2025-02-03 14:05:09.292,127.0.0.1:5001,success
2025-02-03 14:05:09.292,send,0,2
CONN_LOG: 2025-02-03 14:05:09.542,127.0.0.1:5002,failed,Connection refused (os error 111)
2025-02-03 14:05:09.600,receive,1,9
garbage,line
2025-02-03 14:05:09.792,process,0,10
";

    #[test]
    fn parses_rows_and_skips_connection_lines() {
        let log = parse_log(3, SAMPLE);
        assert_eq!(log.tick_rate, Some(4));
        assert_eq!(log.events.len(), 4);
        assert_eq!(log.connection_successes, 1);
        assert_eq!(log.connection_failures, 1);
        assert_eq!(log.skipped_lines, 1);

        let receive = &log.events[2];
        assert_eq!(receive.kind, EventKind::Receive);
        assert_eq!(receive.queue_length, 1);
        assert_eq!(receive.logical_clock, 9);
        assert_eq!(
            receive.timestamp.format("%H:%M:%S%.3f").to_string(),
            "14:05:09.600"
        );
    }

    #[test]
    fn rows_before_header_are_ignored() {
        let log = parse_log(1, "2025-02-03 14:05:09.042,internal,0,1\n");
        assert!(log.events.is_empty());
    }

    #[test]
    fn rejects_unknown_kind_and_extra_columns() {
        assert!(parse_row("2025-02-03 14:05:09.042,connection,0,1").is_none());
        assert!(parse_row("2025-02-03 14:05:09.042,send,0,1,extra").is_none());
        assert!(parse_row("2025-02-03 14:05:09.042,send,-1,1").is_none());
    }

    #[test]
    fn extracts_machine_id_from_file_name() {
        assert_eq!(machine_id_from_file_name("machine_12.log"), Some(12));
        assert_eq!(machine_id_from_file_name("machine_x.log"), None);
        assert_eq!(machine_id_from_file_name("analysis_report.txt"), None);
    }
}
