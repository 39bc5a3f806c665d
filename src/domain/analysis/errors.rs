//! Errors raised by the analysis engine.
//!
//! Degenerate-but-valid outcomes (a Monte Carlo run where every draw was
//! discarded, a zero denominator in a ratio) are returned as data, never as
//! one of these variants.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors produced by matrix construction, validation, and the analyzers.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("Invalid comparison matrix: {reason}")]
    InvalidMatrix { reason: String },

    #[error(
        "Reciprocal violation at ({row}, {col}): {value} * {reciprocal} = {product}, expected 1"
    )]
    ReciprocalViolation {
        row: usize,
        col: usize,
        value: f64,
        reciprocal: f64,
        product: f64,
    },

    #[error("Group consensus requires at least one evaluator")]
    NoEvaluators,

    #[error("Parameter '{name}' is invalid: {reason}")]
    InvalidParameter { name: String, reason: String },
}

impl AnalysisError {
    /// Creates an invalid matrix error.
    pub fn invalid_matrix(reason: impl Into<String>) -> Self {
        AnalysisError::InvalidMatrix {
            reason: reason.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        AnalysisError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code used when this error crosses into other layers.
    pub fn code(&self) -> ErrorCode {
        match self {
            AnalysisError::InvalidMatrix { .. } => ErrorCode::InvalidMatrix,
            AnalysisError::ReciprocalViolation { .. } => ErrorCode::ReciprocalViolation,
            AnalysisError::NoEvaluators => ErrorCode::NoEvaluators,
            AnalysisError::InvalidParameter { .. } => ErrorCode::InvalidParameter,
        }
    }
}

impl From<AnalysisError> for DomainError {
    fn from(err: AnalysisError) -> Self {
        let domain = DomainError::new(err.code(), err.to_string());
        match err {
            AnalysisError::ReciprocalViolation { row, col, .. } => domain
                .with_detail("row", row.to_string())
                .with_detail("col", col.to_string()),
            AnalysisError::InvalidParameter { name, .. } => domain.with_detail("field", name),
            _ => domain,
        }
    }
}
