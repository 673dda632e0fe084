//! Diagnostic logging configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Default filter directive; `RUST_LOG` takes precedence when set.
    #[validate(custom(function = validate_level))]
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            json: false,
        }
    }
}

fn validate_level(level: &str) -> Result<(), ValidationError> {
    let valid = ["trace", "debug", "info", "warn", "error"]
        .contains(&level.to_lowercase().as_str());
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_log_level"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_levels() {
        let config = TelemetryConfig {
            log_level: "DEBUG".into(),
            json: true,
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_level() {
        let config = TelemetryConfig {
            log_level: "loud".into(),
            json: false,
        };
        assert!(config.validate().is_err());
    }
}
