//! Error types for accounting equation checks.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by accounting equation guards.
#[derive(Debug, Error)]
pub enum EquationError {
    /// The equation does not hold after a posting.
    #[error("Accounting equation violated after {reference}: {detail}")]
    Violated {
        /// What was just posted (type and id).
        reference: String,
        /// `assets - (liabilities + equity + net income)`.
        diff: Decimal,
        /// First warning from the report.
        detail: String,
    },

    /// The retained earnings account exists but cannot receive a close.
    #[error("Retained earnings account {code} is {reason}; net income was not closed")]
    RetainedEarningsUnusable {
        /// Configured retained earnings code.
        code: String,
        /// Why the account was rejected.
        reason: &'static str,
    },
}

impl EquationError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Violated { .. } => "ACCOUNTING_EQUATION_VIOLATED",
            Self::RetainedEarningsUnusable { .. } => "RETAINED_EARNINGS_UNUSABLE",
        }
    }
}
