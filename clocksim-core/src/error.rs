use thiserror::Error;

/// Failure to decode a payload read from an inbound connection.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("Empty payload")]
    Empty,

    #[error("Payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Malformed clock message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Clock value {0} leaves no room to advance")]
    ClockOverflow(u64),
}

/// The clock cannot advance past `u64::MAX`. The cell is left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Logical clock overflow at {current} (incoming {incoming:?})")]
pub struct ClockOverflow {
    pub current: u64,
    pub incoming: Option<u64>,
}

/// Failure to append to an event sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Event sink I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A log row named an event kind this crate does not know.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown event kind '{0}'")]
pub struct UnknownEventKind(pub String);
