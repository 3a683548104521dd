//! Configuration loading and validation.
//!
//! # Example
//!
//! ```no_run
//! use corebid::infrastructure::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("corebid.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use super::logging::LoggingConfig;
use crate::application::experiment::ExperimentConfig;
use crate::application::payment::CoreConfig;
use crate::error::{ConfigError, Result};

/// Complete configuration. Every section is optional in the TOML file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Logging and tracing configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Constraint-generation tolerances and caps.
    #[serde(default)]
    pub core: CoreConfig,

    /// Experiment driver settings.
    #[serde(default)]
    pub experiment: ExperimentConfig,
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        reason: reason.to_string(),
    }
}

impl Config {
    /// Parse and validate configuration from TOML content.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is malformed or validation fails.
    #[allow(clippy::result_large_err)]
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the TOML is malformed or
    /// validation fails.
    #[allow(clippy::result_large_err)]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Initialize the tracing subscriber from the `[logging]` section.
    pub fn init_logging(&self) {
        self.logging.init();
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if EnvFilter::try_new(&self.logging.level).is_err() {
            return Err(invalid("level", "not a valid filter directive"));
        }

        let core = &self.core;
        if !(core.tolerance > 0.0) {
            return Err(invalid("tolerance", "must be greater than 0"));
        }
        if core.max_iterations == 0 {
            return Err(invalid("max_iterations", "must be greater than 0"));
        }
        if !(core.payment_slack >= 0.0) {
            return Err(invalid("payment_slack", "must be 0 or greater"));
        }
        if !(core.ir_tolerance >= 0.0) {
            return Err(invalid("ir_tolerance", "must be 0 or greater"));
        }

        let experiment = &self.experiment;
        if experiment.trials == 0 {
            return Err(invalid("trials", "must be greater than 0"));
        }
        if experiment.workers == Some(0) {
            return Err(invalid("workers", "must be greater than 0"));
        }
        if experiment.mechanisms.is_empty() {
            return Err(invalid("mechanisms", "at least one mechanism is required"));
        }

        let llg = &experiment.llg;
        if !(llg.local_max > 0.0) {
            return Err(invalid("local_max", "must be greater than 0"));
        }
        if !(llg.global_max > 0.0) {
            return Err(invalid("global_max", "must be greater than 0"));
        }
        if !(llg.cost_max >= 0.0) {
            return Err(invalid("cost_max", "must be 0 or greater"));
        }
        if llg.availability.len() != 2 {
            return Err(invalid("availability", "needs one probability per good (2)"));
        }
        if llg.availability.iter().any(|p| !(0.0..=1.0).contains(p)) {
            return Err(invalid("availability", "probabilities must be between 0 and 1"));
        }

        Ok(())
    }
}
