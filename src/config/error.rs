//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid log filter '{filter}': {reason}")]
    InvalidLogFilter { filter: String, reason: String },

    #[error("Invalid {section} configuration: {reason}")]
    InvalidSection {
        section: &'static str,
        reason: String,
    },
}

impl ValidationError {
    pub(crate) fn section(section: &'static str, reason: impl ToString) -> Self {
        Self::InvalidSection {
            section,
            reason: reason.to_string(),
        }
    }
}
