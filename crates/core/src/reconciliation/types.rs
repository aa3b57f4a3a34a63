//! Reconciliation domain types.

use std::fmt;

use chrono::{DateTime, Utc};
use ledgerwatch_shared::types::{CashBankAccountId, CashBankTransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::period::Period;
use crate::integrity::Severity;

/// A cash/bank ledger line as stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    /// Transaction id.
    pub id: CashBankTransactionId,
    /// Effective date.
    pub transaction_date: DateTime<Utc>,
    /// Source document kind (e.g. `PAYMENT`, `BALANCE_CORRECTION`).
    pub reference_type: String,
    /// Source document id.
    pub reference_id: Option<String>,
    /// Signed amount: positive is a debit (inflow).
    pub amount: Decimal,
    /// Running balance after this line.
    pub balance_after: Decimal,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// A transaction frozen into a snapshot, with its debit/credit split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrozenTransaction {
    /// Id of the original transaction.
    pub transaction_id: CashBankTransactionId,
    /// Effective date.
    pub transaction_date: DateTime<Utc>,
    /// Source document kind.
    pub reference_type: String,
    /// Source document id.
    pub reference_id: Option<String>,
    /// Signed amount.
    pub amount: Decimal,
    /// Positive part of `amount`.
    pub debit_amount: Decimal,
    /// Negated negative part of `amount`.
    pub credit_amount: Decimal,
    /// Running balance after this line.
    pub balance_after: Decimal,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl From<&LedgerTransaction> for FrozenTransaction {
    fn from(tx: &LedgerTransaction) -> Self {
        let (debit_amount, credit_amount) = if tx.amount > Decimal::ZERO {
            (tx.amount, Decimal::ZERO)
        } else {
            (Decimal::ZERO, -tx.amount)
        };
        Self {
            transaction_id: tx.id,
            transaction_date: tx.transaction_date,
            reference_type: tx.reference_type.clone(),
            reference_id: tx.reference_id.clone(),
            amount: tx.amount,
            debit_amount,
            credit_amount,
            balance_after: tx.balance_after,
            notes: tx.notes.clone(),
        }
    }
}

/// Everything a snapshot's hash covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotContent {
    /// Cash/bank account.
    pub account_id: CashBankAccountId,
    /// Calendar month.
    pub period: Period,
    /// Balance before the first transaction of the period.
    pub opening_balance: Decimal,
    /// `opening + debit - credit`.
    pub closing_balance: Decimal,
    /// Sum of positive amounts.
    pub total_debit: Decimal,
    /// Sum of negated negative amounts.
    pub total_credit: Decimal,
    /// Number of transactions in the period.
    pub transaction_count: usize,
    /// Transactions ordered by `(date, id)`.
    pub transactions: Vec<FrozenTransaction>,
}

/// Lifecycle of a stored snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SnapshotStatus {
    /// Open; may still be deleted if unreferenced.
    Active,
    /// Sealed by `lock_snapshot`.
    Locked,
}

/// Review state of a reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconciliationStatus {
    /// Awaiting review.
    Pending,
    /// Accepted by a reviewer; read-only.
    Approved,
    /// Rejected by a reviewer with a reason.
    Rejected,
}

impl ReconciliationStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ReconciliationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of difference between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DifferenceType {
    /// In the base snapshot only.
    Missing,
    /// In the comparison snapshot only.
    Added,
    /// Amount differs.
    AmountChange,
    /// Transaction date differs.
    DateChange,
}

impl DifferenceType {
    /// Returns the string representation of the type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "MISSING",
            Self::Added => "ADDED",
            Self::AmountChange => "AMOUNT_CHANGE",
            Self::DateChange => "DATE_CHANGE",
        }
    }

    /// Fixed severity for each kind.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Missing | Self::DateChange => Severity::High,
            Self::Added => Severity::Medium,
            Self::AmountChange => Severity::Critical,
        }
    }
}

impl fmt::Display for DifferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed difference between a base and a comparison snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difference {
    /// Kind of difference.
    pub difference_type: DifferenceType,
    /// Severity, fixed per kind.
    pub severity: Severity,
    /// Transaction id as seen in the base snapshot.
    pub base_transaction_id: Option<CashBankTransactionId>,
    /// Transaction id as seen in the comparison snapshot.
    pub current_transaction_id: Option<CashBankTransactionId>,
    /// Changed field, for change kinds.
    pub field: Option<String>,
    /// Value before.
    pub old_value: Option<String>,
    /// Value after.
    pub new_value: Option<String>,
    /// `new - old` for amount changes, zero otherwise.
    pub amount_difference: Decimal,
    /// Human-readable summary.
    pub description: String,
}

/// Variances and verdict of a reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSummary {
    /// Closing balance of the base snapshot.
    pub base_balance: Decimal,
    /// Closing balance of the comparison snapshot.
    pub current_balance: Decimal,
    /// `current - base`.
    pub variance: Decimal,
    /// Transactions in the base snapshot.
    pub base_transaction_count: i64,
    /// Transactions in the comparison snapshot.
    pub current_transaction_count: i64,
    /// `current - base`.
    pub transaction_variance: i64,
    /// MISSING differences.
    pub missing_transactions: usize,
    /// ADDED differences.
    pub added_transactions: usize,
    /// Shared transactions with at least one change.
    pub modified_transactions: usize,
    /// Zero variances and no differences.
    pub is_balanced: bool,
}
