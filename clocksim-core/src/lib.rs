//! # clocksim-core
//!
//! Shared building blocks for a simulated machine: the Lamport clock cell,
//! the inbound message queue, the wire codec and the event model consumed
//! by event sinks.
//!
//! ### Key Submodules:
//! - `clock`: `LamportClock` using an atomic counter
//! - `inbox`: unbounded FIFO of received clock values
//! - `wire`: single-field JSON payload exchanged between machines
//! - `events`: event records, connection status and the `EventSink` seam

pub mod clock;
pub mod error;
pub mod events;
pub mod inbox;
pub mod wire;

pub mod prelude {
    pub use crate::clock::*;
    pub use crate::error::*;
    pub use crate::events::*;
    pub use crate::inbox::*;
    pub use crate::wire::*;
}

pub use clock::LamportClock;
pub use error::{ClockOverflow, SinkError, UnknownEventKind, WireError};
pub use events::{ConnectionStatus, EventKind, EventRecord, EventSink, MemorySink};
pub use inbox::Inbox;
pub use wire::ClockMessage;
