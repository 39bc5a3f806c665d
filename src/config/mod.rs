//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `DECISION_ANALYTICS` prefix and nested values use double underscores as separators.
//! An optional file (TOML, JSON or YAML, chosen by extension) can sit underneath
//! the environment.
//!
//! # Example
//!
//! ```no_run
//! use decision_analytics::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//!
//! println!("Monte Carlo iterations: {}", config.monte_carlo.iterations);
//! ```

mod error;
mod telemetry;

pub use error::{ConfigError, ValidationError};
pub use telemetry::TelemetryConfig;

use std::path::Path;

use serde::Deserialize;

use crate::domain::analysis::{
    DecisionAnalysisSettings, MonteCarloConfig, RobustnessConfig, SensitivityConfig,
};

const ENV_PREFIX: &str = "DECISION_ANALYTICS";

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a usable config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Monte Carlo simulation settings
    #[serde(default)]
    pub monte_carlo: MonteCarloConfig,

    /// Weight sweep and bisection settings
    #[serde(default)]
    pub sensitivity: SensitivityConfig,

    /// Robustness component weights and thresholds
    #[serde(default)]
    pub robustness: RobustnessConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DECISION_ANALYTICS` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    /// 5. Validates every section
    ///
    /// # Environment Variable Format
    ///
    /// - `DECISION_ANALYTICS__MONTE_CARLO__ITERATIONS=5000` -> `monte_carlo.iterations = 5000`
    /// - `DECISION_ANALYTICS__TELEMETRY__JSON=true` -> `telemetry.json = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    /// or fall outside their valid ranges.
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Load configuration from a file, with environment variables taking
    /// precedence over its values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing or malformed, or if any
    /// value cannot be parsed or is out of range.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(Some(path.as_ref()))
    }

    fn build(file: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path));
        }

        let config: Self = builder
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the first section that is out of range.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.telemetry.validate()?;
        self.monte_carlo
            .validate()
            .map_err(|e| ValidationError::section("monte_carlo", e))?;
        self.sensitivity
            .validate()
            .map_err(|e| ValidationError::section("sensitivity", e))?;
        self.robustness
            .validate()
            .map_err(|e| ValidationError::section("robustness", e))?;
        Ok(())
    }

    /// Analyzer settings for the decision analysis pipeline.
    pub fn settings(&self) -> DecisionAnalysisSettings {
        DecisionAnalysisSettings {
            monte_carlo: self.monte_carlo.clone(),
            sensitivity: self.sensitivity.clone(),
            robustness: self.robustness.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::NoiseDistribution;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "DECISION_ANALYTICS__MONTE_CARLO__ITERATIONS",
        "DECISION_ANALYTICS__MONTE_CARLO__DISTRIBUTION",
        "DECISION_ANALYTICS__MONTE_CARLO__SEED",
        "DECISION_ANALYTICS__TELEMETRY__JSON",
        "DECISION_ANALYTICS__SENSITIVITY__SCAN_STEPS",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_defaults_without_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.telemetry.log_filter, "info");
        assert_eq!(config.monte_carlo.iterations, 10_000);
        assert_eq!(config.monte_carlo.seed, None);
        assert_eq!(config.sensitivity.scan_steps, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DECISION_ANALYTICS__MONTE_CARLO__ITERATIONS", "5000");
        env::set_var("DECISION_ANALYTICS__MONTE_CARLO__DISTRIBUTION", "beta");
        env::set_var("DECISION_ANALYTICS__MONTE_CARLO__SEED", "42");
        env::set_var("DECISION_ANALYTICS__TELEMETRY__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.monte_carlo.iterations, 5000);
        assert_eq!(config.monte_carlo.distribution, NoiseDistribution::Beta);
        assert_eq!(config.monte_carlo.seed, Some(42));
        assert!(config.telemetry.json);
    }

    #[test]
    fn test_environment_overrides_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[monte_carlo]\niterations = 2000\nuncertainty_level = 0.2\n\n[sensitivity]\nscan_steps = 50"
        )
        .unwrap();

        env::set_var("DECISION_ANALYTICS__SENSITIVITY__SCAN_STEPS", "80");
        let result = AppConfig::load_from(file.path());
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.monte_carlo.iterations, 2000);
        assert!((config.monte_carlo.uncertainty_level - 0.2).abs() < 1e-12);
        assert_eq!(config.sensitivity.scan_steps, 80);
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        let result = AppConfig::load_from("/nonexistent/decision-analytics.toml");
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn test_load_rejects_out_of_range_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("DECISION_ANALYTICS__MONTE_CARLO__ITERATIONS", "10");
        let result = AppConfig::load();
        clear_env();

        match result {
            Err(ConfigError::ValidationFailed(ValidationError::InvalidSection {
                section, ..
            })) => assert_eq!(section, "monte_carlo"),
            other => panic!("expected monte_carlo validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_out_of_range_iterations() {
        let mut config = AppConfig::default();
        config.monte_carlo.iterations = 10;

        match config.validate() {
            Err(ValidationError::InvalidSection { section, .. }) => {
                assert_eq!(section, "monte_carlo")
            }
            other => panic!("expected monte_carlo validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_settings_mirror_sections() {
        let mut config = AppConfig::default();
        config.monte_carlo = config.monte_carlo.clone().with_seed(7);
        config.sensitivity.scan_steps = 40;

        let settings = config.settings();
        assert_eq!(settings.monte_carlo.seed, Some(7));
        assert_eq!(settings.sensitivity.scan_steps, 40);
        assert_eq!(settings.robustness, config.robustness);
    }
}
