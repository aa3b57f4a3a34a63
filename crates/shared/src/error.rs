//! Application-wide error types.
//!
//! Every repository error in the workspace converts into [`AppError`] so the
//! daemon and any embedding service see one vocabulary of failures.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Business rule violation.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// Conflict (e.g., snapshot already locked).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Another operation holds an exclusive resource; retry later.
    #[error("Busy: {0}")]
    Busy(String),

    /// The operation did not finish before its deadline.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Busy(_) => 503,
            Self::Timeout(_) => 504,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Busy(_) => "BUSY",
            Self::Timeout(_) => "TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the caller may retry the same request later.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_) | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::BusinessRule(String::new()), 422, "BUSINESS_RULE_VIOLATION")]
    #[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
    #[case(AppError::Busy(String::new()), 503, "BUSY")]
    #[case(AppError::Timeout(String::new()), 504, "TIMEOUT")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(#[case] err: AppError, #[case] status: u16, #[case] code: &str) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_only_busy_and_timeout_are_retryable() {
        assert!(AppError::Busy("cycle".into()).is_retryable());
        assert!(AppError::Timeout("validate".into()).is_retryable());
        assert!(!AppError::Database("down".into()).is_retryable());
        assert!(!AppError::Conflict("locked".into()).is_retryable());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Conflict("snapshot already locked".into()).to_string(),
            "Conflict: snapshot already locked"
        );
        assert_eq!(
            AppError::Timeout("validate_all".into()).to_string(),
            "Timed out: validate_all"
        );
    }
}
