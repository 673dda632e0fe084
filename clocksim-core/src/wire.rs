//! Wire payload exchanged between machines.
//!
//! One message per connection: the UTF-8 JSON object `{"logical_clock": N}`,
//! written in full and followed by close. There is no length prefix; the
//! receiver decodes whatever a single bounded read returned.

use serde::{Deserialize, Serialize};

use crate::error::WireError;

/// The sender's logical clock at send time. Carries nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockMessage {
    pub logical_clock: u64,
}

impl ClockMessage {
    pub fn new(logical_clock: u64) -> Self {
        Self { logical_clock }
    }

    pub fn encode(&self) -> Vec<u8> {
        // Serializing a struct of one integer field cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.is_empty() {
            return Err(WireError::Empty);
        }
        let text = std::str::from_utf8(bytes)?;
        let message: Self = serde_json::from_str(text.trim())?;
        // A receiver must be able to step strictly past the carried value.
        if message.logical_clock == u64::MAX {
            return Err(WireError::ClockOverflow(message.logical_clock));
        }
        Ok(message)
    }
}
