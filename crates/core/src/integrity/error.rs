//! Error types for consistency checks.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised while configuring or assembling consistency checks.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    /// Severity bounds are negative or inverted.
    #[error("Invalid severity thresholds: minor {minor} must be between 0 and critical {critical}")]
    InvalidThresholds {
        /// Critical bound.
        critical: Decimal,
        /// Minor bound.
        minor: Decimal,
    },

    /// Tolerance must not be negative.
    #[error("Invalid tolerance: {0}")]
    InvalidTolerance(Decimal),
}

impl ConsistencyError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidThresholds { .. } => "INVALID_THRESHOLDS",
            Self::InvalidTolerance(_) => "INVALID_TOLERANCE",
        }
    }
}
