//! Error types for custom-metrics-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in custom-metrics-core
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Field name is not identifier-shaped
    #[error("Invalid field name: '{0}'")]
    InvalidFieldName(String),

    /// Field name appears twice in a field set
    #[error("Duplicate field name: '{0}'")]
    DuplicateField(String),
}
