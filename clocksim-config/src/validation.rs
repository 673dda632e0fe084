//! Custom validation functions shared by the configuration modules.

use validator::ValidationError;

use crate::fleet::FleetConfig;

/// Validate that a bind or peer address is a non-empty host without a port.
pub fn validate_host(address: &str) -> Result<(), ValidationError> {
    let valid = !address.is_empty()
        && !address.contains(char::is_whitespace)
        && !address.contains('/');
    if valid {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_host"))
    }
}

/// Validate that the fleet's tick rate range is ordered and its ports fit.
pub fn validate_fleet(fleet: &FleetConfig) -> Result<(), ValidationError> {
    if fleet.tick_rate_min > fleet.tick_rate_max {
        return Err(ValidationError::new("tick_rate_min_exceeds_max"));
    }
    let last_port = u32::from(fleet.base_port) + fleet.machines.saturating_sub(1) as u32;
    if last_port > u32::from(u16::MAX) {
        return Err(ValidationError::new("port_range_overflow"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_hostnames_and_ips() {
        assert!(validate_host("127.0.0.1").is_ok());
        assert!(validate_host("localhost").is_ok());
        assert!(validate_host("::1").is_ok());
    }

    #[test]
    fn rejects_blank_hosts() {
        assert!(validate_host("").is_err());
        assert!(validate_host("local host").is_err());
    }

    #[test]
    fn rejects_inverted_tick_range() {
        let fleet = FleetConfig {
            tick_rate_min: 5,
            tick_rate_max: 2,
            ..FleetConfig::default()
        };
        assert!(validate_fleet(&fleet).is_err());
    }

    #[test]
    fn rejects_port_overflow() {
        let fleet = FleetConfig {
            base_port: u16::MAX,
            machines: 2,
            ..FleetConfig::default()
        };
        assert!(validate_fleet(&fleet).is_err());
    }
}
