//! ## clocksim-core::events
//! **Clock-affecting events and the sink they are recorded to**
//!
//! Every mutation of a machine's logical clock produces exactly one
//! `EventRecord`. Outbound connection attempts additionally produce a
//! free-text `ConnectionStatus`. Both are handed to an `EventSink`, which
//! decides where they go (a per-machine log file, memory, ...).
//!
//! The textual forms defined here are the on-disk event log format read by
//! the offline analyzer.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local};
use parking_lot::Mutex;

use crate::error::{SinkError, UnknownEventKind};

/// Timestamp layout used in every log row (millisecond precision).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Column header preceding the event rows.
pub const CSV_HEADER: &str = "Time,Event,Queue Length,Logical Clock";

/// Marker that starts every connection status line.
pub const CONN_LOG_PREFIX: &str = "CONN_LOG:";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Internal,
    Send,
    Receive,
    Process,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::Internal,
        EventKind::Send,
        EventKind::Receive,
        EventKind::Process,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Internal => "internal",
            EventKind::Send => "send",
            EventKind::Receive => "receive",
            EventKind::Process => "process",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// One clock-affecting action, as recorded.
#[derive(Clone, Debug, PartialEq)]
pub struct EventRecord {
    pub timestamp: DateTime<Local>,
    pub kind: EventKind,
    /// Inbox length at the moment of recording.
    pub queue_length: usize,
    /// Logical clock after the action.
    pub logical_clock: u64,
}

impl EventRecord {
    pub fn now(kind: EventKind, queue_length: usize, logical_clock: u64) -> Self {
        Self {
            timestamp: Local::now(),
            kind,
            queue_length,
            logical_clock,
        }
    }

    /// `<timestamp>,<kind>,<queue length>,<clock>`
    pub fn to_row(&self) -> String {
        format!(
            "{},{},{},{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.kind,
            self.queue_length,
            self.logical_clock
        )
    }
}

/// Outcome of one outbound connection attempt.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionStatus {
    pub timestamp: DateTime<Local>,
    /// `address:port` of the peer.
    pub peer: String,
    pub success: bool,
    pub reason: Option<String>,
}

impl ConnectionStatus {
    pub fn succeeded(peer: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            peer: peer.into(),
            success: true,
            reason: None,
        }
    }

    pub fn failed(peer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            peer: peer.into(),
            success: false,
            reason: Some(reason.into()),
        }
    }

    /// `CONN_LOG: <timestamp>,<peer>,<success|failed>[,<reason>]`
    pub fn to_line(&self) -> String {
        let status = if self.success { "success" } else { "failed" };
        let mut line = format!(
            "{} {},{},{}",
            CONN_LOG_PREFIX,
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.peer,
            status
        );
        if let Some(reason) = &self.reason {
            // Keep the line single-row for CSV consumers.
            line.push(',');
            line.push_str(&reason.replace(['\n', '\r'], " "));
        }
        line
    }
}

/// Destination for recorded events. Implementations must tolerate concurrent
/// calls from a machine's listener and ticker.
pub trait EventSink: Send + Sync {
    fn append(&self, record: &EventRecord) -> Result<(), SinkError>;

    fn append_connection(&self, status: &ConnectionStatus) -> Result<(), SinkError>;
}

/// Keeps everything in memory. Used when no log file is wanted, and by tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EventRecord>>,
    connections: Mutex<Vec<ConnectionStatus>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<EventRecord> {
        self.records.lock().clone()
    }

    pub fn connections(&self) -> Vec<ConnectionStatus> {
        self.connections.lock().clone()
    }

    pub fn records_of(&self, kind: EventKind) -> Vec<EventRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect()
    }
}

impl EventSink for MemorySink {
    fn append(&self, record: &EventRecord) -> Result<(), SinkError> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    fn append_connection(&self, status: &ConnectionStatus) -> Result<(), SinkError> {
        self.connections.lock().push(status.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2025, 2, 3, 14, 5, 9)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(42))
            .unwrap()
    }

    #[test]
    fn event_kind_round_trips_through_text() {
        for kind in EventKind::ALL {
            assert_eq!(kind.to_string().parse::<EventKind>().unwrap(), kind);
        }
        assert_eq!(
            "connection".parse::<EventKind>(),
            Err(UnknownEventKind("connection".into()))
        );
        assert_eq!(
            UnknownEventKind("x".into()).to_string(),
            "Unknown event kind 'x'"
        );
    }

    #[test]
    fn row_uses_millisecond_timestamp() {
        let record = EventRecord {
            timestamp: fixed_time(),
            kind: EventKind::Receive,
            queue_length: 2,
            logical_clock: 17,
        };
        assert_eq!(record.to_row(), "2025-02-03 14:05:09.042,receive,2,17");
    }

    #[test]
    fn connection_line_is_prefixed() {
        let mut status = ConnectionStatus::failed("127.0.0.1:5001", "connection refused\n");
        status.timestamp = fixed_time();
        assert_eq!(
            status.to_line(),
            "CONN_LOG: 2025-02-03 14:05:09.042,127.0.0.1:5001,failed,connection refused "
        );

        let mut ok = ConnectionStatus::succeeded("127.0.0.1:5002");
        ok.timestamp = fixed_time();
        assert!(ok.to_line().ends_with(",127.0.0.1:5002,success"));
    }

    #[test]
    fn memory_sink_filters_by_kind() {
        let sink = MemorySink::new();
        sink.append(&EventRecord::now(EventKind::Internal, 0, 1)).unwrap();
        sink.append(&EventRecord::now(EventKind::Send, 0, 2)).unwrap();
        sink.append(&EventRecord::now(EventKind::Internal, 0, 3)).unwrap();
        assert_eq!(sink.records().len(), 3);
        assert_eq!(sink.records_of(EventKind::Internal).len(), 2);
        assert!(sink.connections().is_empty());
    }
}
