//! Domain types for balance integrity validation.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerwatch_shared::types::{CashBankAccountId, GlAccountId, JournalEntryId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::severity::Severity;

/// The four check passes, in the order they run and report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckKind {
    /// Cached cash/bank balance vs. sum of its transactions.
    CashBankTransaction,
    /// Cached cash/bank balance vs. linked GL account balance.
    CashBankGl,
    /// Debit/credit totals of posted journal entries.
    JournalBalance,
    /// Balance that is exactly twice the transaction sum.
    DoublePosting,
}

impl CheckKind {
    /// All checks in execution order.
    pub const ALL: [Self; 4] = [
        Self::CashBankTransaction,
        Self::CashBankGl,
        Self::JournalBalance,
        Self::DoublePosting,
    ];

    /// Returns the string representation of the check.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CashBankTransaction => "CASHBANK_TRANSACTION",
            Self::CashBankGl => "CASHBANK_GL",
            Self::JournalBalance => "JOURNAL_BALANCE",
            Self::DoublePosting => "DOUBLE_POSTING",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Input rows
// ============================================================================

/// A cash/bank account with its cached balance and the sum of its ledger lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashBankSumRow {
    /// Cash/bank account id.
    pub account_id: CashBankAccountId,
    /// Account code.
    pub code: String,
    /// Account name.
    pub name: String,
    /// Linked GL account.
    pub gl_account_id: GlAccountId,
    /// Cached balance.
    pub balance: Decimal,
    /// Sum of all transaction amounts for the account.
    pub transaction_sum: Decimal,
}

/// A cash/bank account joined to its linked GL account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashBankGlRow {
    /// Cash/bank account id.
    pub account_id: CashBankAccountId,
    /// Cash/bank account code.
    pub code: String,
    /// Cash/bank account name.
    pub name: String,
    /// Cached cash/bank balance.
    pub balance: Decimal,
    /// Linked GL account id.
    pub gl_account_id: GlAccountId,
    /// GL account code.
    pub gl_code: String,
    /// GL account name.
    pub gl_name: String,
    /// Cached GL balance.
    pub gl_balance: Decimal,
}

/// Debit and credit totals of one posted journal entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalTotalsRow {
    /// Journal entry id.
    pub entry_id: JournalEntryId,
    /// Human-readable entry number.
    pub entry_number: String,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
}

// ============================================================================
// Findings
// ============================================================================

/// A balance mismatch on one cash/bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceFinding {
    /// Cash/bank account id.
    pub account_id: CashBankAccountId,
    /// Cash/bank account code.
    pub account_code: String,
    /// Cash/bank account name.
    pub account_name: String,
    /// Linked GL account.
    pub gl_account_id: GlAccountId,
    /// Value the authoritative side says the balance should be.
    pub expected: Decimal,
    /// Value actually found.
    pub actual: Decimal,
    /// `actual - expected`.
    pub difference: Decimal,
    /// Graded severity.
    pub severity: Severity,
    /// Human-readable summary.
    pub description: String,
}

/// A posted journal entry whose debits and credits disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalFinding {
    /// Journal entry id.
    pub entry_id: JournalEntryId,
    /// Human-readable entry number.
    pub entry_number: String,
    /// Sum of line debits.
    pub total_debit: Decimal,
    /// Sum of line credits.
    pub total_credit: Decimal,
    /// `total_debit - total_credit`.
    pub difference: Decimal,
    /// Always critical.
    pub severity: Severity,
    /// Human-readable summary.
    pub description: String,
}

/// A single finding produced by the validator.
///
/// Each variant carries the fields its fix strategy needs, so the fix
/// planner can match exhaustively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Inconsistency {
    /// Cached balance differs from the transaction sum.
    TransactionMismatch(BalanceFinding),
    /// GL balance differs from the cash/bank balance.
    GlMismatch(BalanceFinding),
    /// Posted journal entry is unbalanced.
    UnbalancedJournal(JournalFinding),
    /// Balance is twice the transaction sum.
    DoublePostingPattern(BalanceFinding),
}

impl Inconsistency {
    /// The check that produced this finding.
    #[must_use]
    pub const fn check(&self) -> CheckKind {
        match self {
            Self::TransactionMismatch(_) => CheckKind::CashBankTransaction,
            Self::GlMismatch(_) => CheckKind::CashBankGl,
            Self::UnbalancedJournal(_) => CheckKind::JournalBalance,
            Self::DoublePostingPattern(_) => CheckKind::DoublePosting,
        }
    }

    /// Severity of the finding.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::TransactionMismatch(f) | Self::GlMismatch(f) | Self::DoublePostingPattern(f) => {
                f.severity
            }
            Self::UnbalancedJournal(f) => f.severity,
        }
    }

    /// Id of the entity the finding is about.
    #[must_use]
    pub const fn entity_id(&self) -> Uuid {
        match self {
            Self::TransactionMismatch(f) | Self::GlMismatch(f) | Self::DoublePostingPattern(f) => {
                f.account_id.into_inner()
            }
            Self::UnbalancedJournal(f) => f.entry_id.into_inner(),
        }
    }

    /// Display name of the entity (account name or entry number).
    #[must_use]
    pub fn entity_name(&self) -> &str {
        match self {
            Self::TransactionMismatch(f) | Self::GlMismatch(f) | Self::DoublePostingPattern(f) => {
                &f.account_name
            }
            Self::UnbalancedJournal(f) => &f.entry_number,
        }
    }

    /// Signed difference between actual and expected.
    #[must_use]
    pub const fn difference(&self) -> Decimal {
        match self {
            Self::TransactionMismatch(f) | Self::GlMismatch(f) | Self::DoublePostingPattern(f) => {
                f.difference
            }
            Self::UnbalancedJournal(f) => f.difference,
        }
    }

    /// Human-readable summary.
    #[must_use]
    pub fn description(&self) -> &str {
        match self {
            Self::TransactionMismatch(f) | Self::GlMismatch(f) | Self::DoublePostingPattern(f) => {
                &f.description
            }
            Self::UnbalancedJournal(f) => &f.description,
        }
    }
}

// ============================================================================
// Reports
// ============================================================================

/// Result of a single check pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckOutcome {
    /// Number of entities evaluated.
    pub checked: usize,
    /// Findings, sorted by account code or entry number.
    pub findings: Vec<Inconsistency>,
}

/// A check that could not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErroredCheck {
    /// Which check failed.
    pub check: CheckKind,
    /// Underlying error message.
    pub message: String,
}

/// Counts of findings per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Critical findings.
    pub critical: usize,
    /// High findings.
    pub high: usize,
    /// Medium findings.
    pub medium: usize,
    /// Low findings.
    pub low: usize,
}

/// Aggregated result of all balance integrity checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    /// True when no findings and no errored checks.
    pub valid: bool,
    /// Entities evaluated across all checks.
    pub total_checks: usize,
    /// Entities that produced a finding.
    pub failed_checks: usize,
    /// Findings grouped by check, in check order.
    pub inconsistencies: Vec<Inconsistency>,
    /// Checks that could not run.
    pub errored_checks: Vec<ErroredCheck>,
    /// When validation started.
    pub validated_at: DateTime<Utc>,
    /// Wall-clock time spent, in milliseconds.
    pub duration_ms: u64,
}

/// Store-wide statistics attached to a health report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatistics {
    /// Active cash/bank accounts.
    pub total_cash_banks: u64,
    /// Sum of cached cash/bank balances.
    pub total_balance: Decimal,
    /// Cash/bank ledger lines.
    pub total_transactions: u64,
    /// Journal entries.
    pub total_journal_entries: u64,
}

/// Validation report enriched with statistics, score and recommendations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHealthReport {
    /// The underlying validation.
    pub validation: ValidationReport,
    /// Store-wide statistics.
    pub statistics: SystemStatistics,
    /// Percentage of checks that passed, two decimal places.
    pub health_score: Decimal,
    /// Operator advice.
    pub recommendations: Vec<String>,
    /// When the report was produced.
    pub generated_at: DateTime<Utc>,
}
