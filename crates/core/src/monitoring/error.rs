//! Monitoring errors.

use ledgerwatch_shared::error::AppError;
use thiserror::Error;

use super::deadline::DeadlineExceeded;

/// Error raised by a probe implementation (usually a database error).
pub type ProbeError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a monitoring cycle did not complete.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// Another cycle or a manual fix holds the guard.
    #[error("monitoring cycle already in progress")]
    Busy,

    /// The cycle ran past its deadline.
    #[error(transparent)]
    Deadline(#[from] DeadlineExceeded),

    /// A check could not read the ledger.
    #[error("monitoring probe failed: {0}")]
    Probe(ProbeError),
}

impl MonitorError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Busy => "MONITOR_BUSY",
            Self::Deadline(_) => "TIMEOUT",
            Self::Probe(_) => "PROBE_FAILED",
        }
    }

    /// Busy and deadline failures may succeed on a later attempt.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy | Self::Deadline(_))
    }
}

impl From<MonitorError> for AppError {
    fn from(err: MonitorError) -> Self {
        match err {
            MonitorError::Busy => Self::Busy("monitoring cycle already in progress".to_string()),
            MonitorError::Deadline(e) => e.into(),
            MonitorError::Probe(e) => Self::Database(e.to_string()),
        }
    }
}
