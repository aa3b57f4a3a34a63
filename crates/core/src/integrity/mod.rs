//! Balance integrity validation.
//!
//! This module cross-checks the three representations of a cash/bank
//! balance:
//! - Cached cash/bank balance vs. the sum of its ledger lines
//! - Cached cash/bank balance vs. the linked GL account
//! - Debit/credit totals of posted journal entries
//! - The double-posting signature (balance = 2x transaction sum)
//!
//! All functions are pure; rows are loaded by the persistence layer.

pub mod checks;
pub mod error;
pub mod report;
pub mod severity;
pub mod types;

#[cfg(test)]
mod checks_props;

pub use checks::{
    DEFAULT_TOLERANCE, check_double_posting, check_gl_mirror, check_journal_balance,
    check_transaction_sums, is_double_posting,
};
pub use error::ConsistencyError;
pub use report::{health_score, recommendations};
pub use severity::{Severity, SeverityThresholds};
pub use types::{
    BalanceFinding, BalanceHealthReport, CashBankGlRow, CashBankSumRow, CheckKind, CheckOutcome,
    ErroredCheck, Inconsistency, JournalFinding, JournalTotalsRow, SeverityCounts,
    SystemStatistics, ValidationReport,
};
