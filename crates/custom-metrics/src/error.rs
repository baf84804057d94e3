//! Metric validation errors

use custom_metrics_core::Metric;
use custom_metrics_formula::{FormulaError, FormulaErrorKind};
use thiserror::Error;

/// Message shown for formulas that do not compile
pub const INVALID_FORMULA_MESSAGE: &str = "Invalid formula. Use available fields and operators.";

/// Message shown for formulas whose probe result is not a finite number
pub const NON_FINITE_MESSAGE: &str = "Formula did not evaluate to a number.";

/// Result type for metric validation
pub type MetricResult<T> = std::result::Result<T, MetricError>;

/// Why a formula was not accepted as a metric
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    /// Formula failed to compile
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Formula compiled but the probe produced NaN or an infinity
    #[error("Formula did not evaluate to a number (got {value})")]
    NonFiniteResult { value: f64 },
}

/// Failure categories a caller can present differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    SyntaxError,
    UnknownField,
    NonFiniteResult,
}

impl MetricError {
    /// Failure category
    pub fn kind(&self) -> FailureKind {
        match self {
            MetricError::Formula(err) => match err.kind() {
                FormulaErrorKind::Syntax => FailureKind::SyntaxError,
                FormulaErrorKind::UnknownField => FailureKind::UnknownField,
            },
            MetricError::NonFiniteResult { .. } => FailureKind::NonFiniteResult,
        }
    }

    /// Character offset to highlight, for compile errors
    pub fn position(&self) -> Option<usize> {
        match self {
            MetricError::Formula(err) => Some(err.position()),
            MetricError::NonFiniteResult { .. } => None,
        }
    }

    /// Short message for the person editing the formula
    pub fn user_message(&self) -> &'static str {
        match self {
            MetricError::Formula(_) => INVALID_FORMULA_MESSAGE,
            MetricError::NonFiniteResult { .. } => NON_FINITE_MESSAGE,
        }
    }
}

/// A metric that could not be added to a [`MetricSet`](crate::MetricSet)
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Metric '{}' is invalid: {error}", .metric.name)]
pub struct MetricFailure {
    pub metric: Metric,
    #[source]
    pub error: MetricError,
}
