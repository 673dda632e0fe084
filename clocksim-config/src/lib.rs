//! # clocksim Configuration System
//!
//! Hierarchical configuration for machines, the fleet orchestrator and
//! diagnostic logging.
//!
//! ## Features
//! - **Layered sources**: defaults, YAML files and `CLOCKSIM_*` environment
//! - **Validation**: every loaded value is range- and shape-checked before use

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod error;
mod fleet;
mod machine;
mod telemetry;
mod validation;

pub use error::ConfigError;
pub use fleet::FleetConfig;
pub use machine::{BroadcastMode, FailedSendPolicy, MachineConfig, PeerEndpoint};
pub use telemetry::TelemetryConfig;

/// Base configuration file, merged over the compiled defaults when present.
pub const BASE_CONFIG_PATH: &str = "config/clocksim.yaml";

/// Top‑level configuration container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
#[serde(default)]
pub struct ClocksimConfig {
    /// Orchestrator parameters.
    #[validate(nested)]
    pub fleet: FleetConfig,

    /// Diagnostic logging parameters.
    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl ClocksimConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default Values
    /// 2. `config/clocksim.yaml` - Base settings. If missing, defaults are used.
    /// 3. `config/<environment>.yaml` - Environment‑specific overrides, where the
    ///    environment comes from `CLOCKSIM_ENV` (default `development`).
    /// 4. `CLOCKSIM_*` environment variables, `__` separating nested keys.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ClocksimConfig::default()));

        if Path::new(BASE_CONFIG_PATH).exists() {
            figment = figment.merge(Yaml::file(BASE_CONFIG_PATH));
        }

        let env = std::env::var("CLOCKSIM_ENV").unwrap_or_else(|_| "development".into());
        let env_file = format!("config/{}.yaml", env);
        if Path::new(&env_file).exists() {
            figment = figment.merge(Yaml::file(env_file));
        }

        Self::extract(figment)
    }

    /// Load configuration from a specific file, still honouring the environment.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        let figment =
            Figment::from(Serialized::defaults(ClocksimConfig::default())).merge(Yaml::file(path));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .merge(Env::prefixed("CLOCKSIM_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config
                    .validate()
                    .map_err(|errors| ConfigError::validation("clocksim", errors))?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn full_config_validation() {
        let config = ClocksimConfig::default();
        config.validate().expect("Default config should validate");
    }

    #[test]
    fn environment_override() {
        Jail::expect_with(|jail| {
            jail.set_env("CLOCKSIM_FLEET__MACHINES", "5");
            jail.set_env("CLOCKSIM_TELEMETRY__LOG_LEVEL", "debug");
            let config = ClocksimConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.fleet.machines, 5);
            assert_eq!(config.telemetry.log_level, "debug");
            Ok(())
        });
    }

    #[test]
    fn base_file_then_environment_file() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/clocksim.yaml",
                "fleet:\n  machines: 4\n  base_port: 6000\n",
            )?;
            jail.create_file(
                "config/staging.yaml",
                "fleet:\n  base_port: 7000\n  broadcast: snapshot\n",
            )?;
            jail.set_env("CLOCKSIM_ENV", "staging");
            let config = ClocksimConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.fleet.machines, 4);
            assert_eq!(config.fleet.base_port, 7000);
            assert_eq!(config.fleet.broadcast, BroadcastMode::Snapshot);
            Ok(())
        });
    }

    #[test]
    fn load_from_missing_path_fails() {
        let result = ClocksimConfig::load_from_path("does/not/exist.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn invalid_file_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "bad.yaml",
                "fleet:\n  internal_event_probability: 2.0\n",
            )?;
            let result = ClocksimConfig::load_from_path("bad.yaml");
            assert!(matches!(result, Err(ConfigError::Validation { .. })));
            Ok(())
        });
    }
}
