//! ## clocksim-core::clock
//! **Lamport logical clock cell**
//!
//! The clock is read and written concurrently by a machine's listener and
//! ticker. Both update rules run as a single compare-and-swap loop, so no
//! update is ever lost and the value never decreases. An update that would
//! pass `u64::MAX` is refused and leaves the value as it was.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::ClockOverflow;

/// A shared Lamport clock. Clones observe and mutate the same counter.
#[derive(Clone, Debug, Default)]
pub struct LamportClock {
    value: Arc<AtomicU64>,
}

impl LamportClock {
    /// Creates a clock starting at `initial`.
    pub fn new(initial: u64) -> Self {
        Self {
            value: Arc::new(AtomicU64::new(initial)),
        }
    }

    /// Current logical time.
    #[inline]
    pub fn now(&self) -> u64 {
        self.value.load(Ordering::Acquire)
    }

    /// Internal or send event: `clock + 1`. Returns the new value.
    #[inline]
    pub fn apply_local(&self) -> Result<u64, ClockOverflow> {
        self.advance(None, |current| current.checked_add(1))
    }

    /// Receive or process event: `max(clock, incoming) + 1`. Returns the new value.
    pub fn apply_received(&self, incoming: u64) -> Result<u64, ClockOverflow> {
        self.advance(Some(incoming), |current| current.max(incoming).checked_add(1))
    }

    fn advance(
        &self,
        incoming: Option<u64>,
        step: impl Fn(u64) -> Option<u64>,
    ) -> Result<u64, ClockOverflow> {
        match self
            .value
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, &step)
        {
            // `step` succeeded on `previous` once, so it succeeds again.
            Ok(previous) => Ok(step(previous).unwrap_or(u64::MAX)),
            Err(current) => Err(ClockOverflow { current, incoming }),
        }
    }
}
