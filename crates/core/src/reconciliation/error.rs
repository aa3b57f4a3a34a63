//! Error types for reconciliation operations.

use thiserror::Error;

use super::types::ReconciliationStatus;

/// Errors raised by snapshot and reconciliation logic.
#[derive(Debug, Error)]
pub enum ReconciliationError {
    /// Period is not a valid `YYYY-MM` string.
    #[error("Invalid period '{0}': expected YYYY-MM")]
    InvalidPeriod(String),

    /// Review attempted on a reconciliation that is no longer pending.
    #[error("Reconciliation is {current}; only PENDING reconciliations can be reviewed")]
    NotPending {
        /// Current status.
        current: ReconciliationStatus,
    },

    /// Rejecting requires a reason.
    #[error("Rejection reason is required")]
    RejectionReasonRequired,

    /// Snapshots being compared belong to different accounts.
    #[error("Snapshots belong to different cash/bank accounts")]
    AccountMismatch,

    /// Canonical hash input could not be serialized.
    #[error("Failed to serialize snapshot content: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReconciliationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidPeriod(_) => "INVALID_PERIOD",
            Self::NotPending { .. } => "RECONCILIATION_NOT_PENDING",
            Self::RejectionReasonRequired => "REJECTION_REASON_REQUIRED",
            Self::AccountMismatch => "SNAPSHOT_ACCOUNT_MISMATCH",
            Self::Serialization(_) => "SNAPSHOT_SERIALIZATION_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidPeriod(_) | Self::RejectionReasonRequired | Self::AccountMismatch => 400,
            Self::NotPending { .. } => 409,
            Self::Serialization(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ReconciliationError::InvalidPeriod("2024-13".into()).error_code(),
            "INVALID_PERIOD"
        );
        assert_eq!(
            ReconciliationError::NotPending {
                current: ReconciliationStatus::Approved
            }
            .http_status_code(),
            409
        );
        assert_eq!(
            ReconciliationError::RejectionReasonRequired.http_status_code(),
            400
        );
    }

    #[test]
    fn test_not_pending_display() {
        let err = ReconciliationError::NotPending {
            current: ReconciliationStatus::Rejected,
        };
        assert_eq!(
            err.to_string(),
            "Reconciliation is REJECTED; only PENDING reconciliations can be reviewed"
        );
    }
}
