//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;
use validator::{ValidationErrors, ValidationErrorsKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// `section` names the rejected value set (`clocksim`, `fleet`, `machine 3`, ...).
    #[error("Invalid {section} configuration:\n{}", describe(.errors))]
    Validation {
        section: String,
        #[source]
        errors: ValidationErrors,
    },

    #[error("Configuration parsing error: {0}")]
    Parsing(#[from] figment::Error),
}

impl ConfigError {
    pub fn validation(section: impl Into<String>, errors: ValidationErrors) -> Self {
        ConfigError::Validation {
            section: section.into(),
            errors,
        }
    }
}

/// One `path: reason` line per failure, nested fields joined with `.`,
/// sorted so the message is stable.
fn describe(errors: &ValidationErrors) -> String {
    let mut lines = Vec::new();
    collect("", errors, &mut lines);
    lines.sort();
    lines
        .iter()
        .map(|line| format!("  - {line}\n"))
        .collect()
}

fn collect(prefix: &str, errors: &ValidationErrors, lines: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let name: &str = field;
        let path = match (prefix.is_empty(), name) {
            // Struct-level checks are reported under `__all__`.
            (true, "__all__") => "(all)".to_string(),
            (false, "__all__") => prefix.to_string(),
            (true, _) => field.to_string(),
            (false, _) => format!("{prefix}.{field}"),
        };
        match kind {
            ValidationErrorsKind::Field(failures) => {
                for failure in failures {
                    let reason = failure
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| failure.code.to_string());
                    lines.push(format!("{path}: {reason}"));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(&path, inner, lines),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(&format!("{path}[{index}]"), inner, lines);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClocksimConfig, FleetConfig, MachineConfig, PeerEndpoint};
    use validator::Validate;

    #[test]
    fn names_nested_fields_and_section() {
        let mut config = ClocksimConfig::default();
        config.fleet.machines = 0;
        config.telemetry.log_level = "loud".into();

        let error = ConfigError::validation("clocksim", config.validate().unwrap_err());
        let message = error.to_string();
        assert!(message.starts_with("Invalid clocksim configuration:\n"));
        assert!(message.contains("  - fleet.machines: range\n"));
        assert!(message.contains("  - telemetry.log_level: invalid_log_level\n"));
    }

    #[test]
    fn reports_schema_checks_under_the_struct() {
        let fleet = FleetConfig {
            tick_rate_min: 6,
            tick_rate_max: 1,
            ..FleetConfig::default()
        };
        let message = ConfigError::validation("fleet", fleet.validate().unwrap_err()).to_string();
        assert!(message.contains("  - (all): tick_rate_min_exceeds_max\n"), "{message}");
    }

    #[test]
    fn indexes_list_entries() {
        let machine = MachineConfig::new(3, "127.0.0.1", 0, 1).with_peers(vec![
            PeerEndpoint::new("127.0.0.1", 5001),
            PeerEndpoint::new("127.0.0.1", 0),
        ]);
        let message =
            ConfigError::validation("machine 3", machine.validate().unwrap_err()).to_string();
        assert!(message.starts_with("Invalid machine 3 configuration:"));
        assert!(message.contains("  - peers[1].port: range\n"), "{message}");
    }
}
