//! ## clocksim-core::inbox
//! **Unbounded FIFO of received clock values**
//!
//! Built on crossbeam's segmented queue for lock-free multi-producer handling.
//! Entries are the raw values carried by inbound messages, kept in arrival
//! order regardless of their numeric value. There is no capacity bound.

use crossbeam::queue::SegQueue;

#[derive(Debug, Default)]
pub struct Inbox {
    queue: SegQueue<u64>,
}

impl Inbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a received clock value. Returns the queue length after the push.
    pub fn push(&self, clock_value: u64) -> usize {
        self.queue.push(clock_value);
        self.queue.len()
    }

    /// Removes the oldest entry.
    pub fn pop(&self) -> Option<u64> {
        self.queue.pop()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
