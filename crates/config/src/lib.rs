#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for dlsim
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/dlsim/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod constants;
pub mod core;

pub use crate::core::{AgentConfig, GeneralConfig, PathConfig, SimulationConfig, TimingConfig};

use constants::APP_DIR;
use dlsim_errors::{ConfigError, Error};
use dlsim_types::{ColorChoice, Mode, ResourceVector};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,

    #[serde(default)]
    pub timing: TimingConfig,

    #[serde(default)]
    pub agent: AgentConfig,

    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub paths: PathConfig,
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            tracing::debug!(path = %config_path.display(), "loading config file");
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path, or the default location
    ///
    /// An explicit path must exist; a missing default file means defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // DLSIM_MODE
        if let Ok(mode) = std::env::var("DLSIM_MODE") {
            self.simulation.mode = mode
                .parse::<Mode>()
                .map_err(|_| invalid("DLSIM_MODE", &mode))?;
        }

        // DLSIM_RESOURCES
        if let Ok(resources) = std::env::var("DLSIM_RESOURCES") {
            self.simulation.resources = parse_resource_list(&resources)
                .map_err(|_| invalid("DLSIM_RESOURCES", &resources))?
                .as_slice()
                .to_vec();
        }

        // DLSIM_PROCESSES
        if let Ok(processes) = std::env::var("DLSIM_PROCESSES") {
            self.simulation.processes = processes
                .trim()
                .parse()
                .map_err(|_| invalid("DLSIM_PROCESSES", &processes))?;
        }

        // DLSIM_SEED
        if let Ok(seed) = std::env::var("DLSIM_SEED") {
            self.simulation.seed = seed.trim().parse().map_err(|_| invalid("DLSIM_SEED", &seed))?;
        }

        // DLSIM_POLL_INTERVAL_MS
        if let Ok(interval) = std::env::var("DLSIM_POLL_INTERVAL_MS") {
            self.timing.poll_interval_ms = interval
                .trim()
                .parse()
                .map_err(|_| invalid("DLSIM_POLL_INTERVAL_MS", &interval))?;
        }

        // DLSIM_COLOR
        if let Ok(color) = std::env::var("DLSIM_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => return Err(invalid("DLSIM_COLOR", &color)),
            };
        }

        Ok(())
    }

    /// Reject settings that cannot describe a runnable simulation
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        let sim = &self.simulation;
        if sim.resources.is_empty() || sim.resources.contains(&0) {
            return Err(invalid("simulation.resources", &format!("{:?}", sim.resources)));
        }
        if sim.processes == 0 {
            return Err(invalid("simulation.processes", "0"));
        }

        let timing = &self.timing;
        if timing.poll_interval_ms == 0 {
            return Err(invalid("timing.poll_interval_ms", "0"));
        }
        if timing.run_timeout_ms == 0 {
            return Err(invalid("timing.run_timeout_ms", "0"));
        }
        if timing.think_time_min_ms > timing.think_time_max_ms {
            return Err(invalid(
                "timing.think_time_min_ms",
                &format!(
                    "{} > think_time_max_ms {}",
                    timing.think_time_min_ms, timing.think_time_max_ms
                ),
            ));
        }

        if self.agent.max_per_step == 0 {
            return Err(invalid("agent.max_per_step", "0"));
        }
        Ok(())
    }

    /// Resource totals as a vector
    #[must_use]
    pub fn total(&self) -> ResourceVector {
        ResourceVector::new(self.simulation.resources.clone())
    }

    /// Directory for JSON debug logs (with default)
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        self.paths.log_dir.clone().unwrap_or_else(|| {
            dirs::state_dir()
                .or_else(dirs::data_local_dir)
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join("logs")
        })
    }
}

fn invalid(field: &str, value: &str) -> Error {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
    .into()
}

/// Parse a comma-separated list of resource totals such as `"3, 3,2"`
///
/// Blank entries are skipped.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if any entry is not a non-negative
/// integer, or if the list is empty.
pub fn parse_resource_list(input: &str) -> Result<ResourceVector, Error> {
    let totals = input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<u32>().map_err(|_| invalid("resources", part)))
        .collect::<Result<Vec<_>, _>>()?;

    if totals.is_empty() {
        return Err(invalid("resources", input));
    }
    Ok(ResourceVector::new(totals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.total(), ResourceVector::from([3, 3, 2]));
        assert_eq!(config.simulation.processes, 5);
        assert_eq!(config.simulation.seed, 123);
        assert_eq!(config.simulation.mode, Mode::Avoidance);
    }

    #[test]
    fn test_parse_resource_list() {
        assert_eq!(
            parse_resource_list("3, 3,2").unwrap(),
            ResourceVector::from([3, 3, 2])
        );
        assert_eq!(
            parse_resource_list("4,,1,").unwrap(),
            ResourceVector::from([4, 1])
        );
        assert!(parse_resource_list("3,x").is_err());
        assert!(parse_resource_list("-1").is_err());
        assert!(parse_resource_list(" , ").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.simulation.resources = vec![2, 0];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.processes = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.timing.think_time_min_ms = 100;
        config.timing.think_time_max_ms = 10;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("think_time_min_ms"));
    }

    #[test]
    fn test_log_dir_override() {
        let mut config = Config::default();
        config.paths.log_dir = Some(PathBuf::from("/tmp/dlsim-logs"));
        assert_eq!(config.log_dir(), PathBuf::from("/tmp/dlsim-logs"));
    }
}
