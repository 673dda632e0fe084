//! # clocksim-machine
//!
//! A simulated machine: a listener and a ticker running concurrently over a
//! shared Lamport clock and inbox, plus the fleet orchestrator that runs
//! several of them against each other.
//!
//! ### Components:
//! - `listener`: accepts one connection at a time, one receive event each
//! - `sender`: one ephemeral connection per outbound message
//! - `ticker`: per-tick drain or weighted workload choice
//! - `machine`: start/stop lifecycle
//! - `fleet`: builds, starts and stops a set of peered machines

pub mod context;
pub mod error;
pub mod fleet;
pub mod listener;
pub mod machine;
pub mod sender;
pub mod ticker;

pub use context::MachineContext;
pub use error::{MachineError, ReceiveError, SendError};
pub use fleet::Fleet;
pub use machine::{Machine, MachineState};
pub use sender::Sender;
pub use ticker::{ActionTable, TickAction, TickOutcome, Ticker};

pub mod prelude {
    pub use super::{Fleet, Machine, MachineError, MachineState};
}
