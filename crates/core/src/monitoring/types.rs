//! Monitoring report types.

use chrono::{DateTime, Utc};
use ledgerwatch_shared::types::{CashBankAccountId, GlAccountId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::fix::FixSummary;
use super::status::{CycleState, DoublePostingStatus, SyncStatus};
use crate::integrity::{CashBankGlRow, CheckOutcome, Inconsistency, health_score, is_double_posting};

/// A cash/bank account whose GL mirror has drifted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncDiscrepancy {
    /// Cash/bank account id.
    pub cash_bank_id: CashBankAccountId,
    /// Cash/bank account code.
    pub cash_bank_code: String,
    /// Cash/bank account name.
    pub cash_bank_name: String,
    /// Cached cash/bank balance (authoritative).
    pub cash_bank_balance: Decimal,
    /// Linked GL account id.
    pub gl_account_id: GlAccountId,
    /// GL account code.
    pub gl_code: String,
    /// GL account name.
    pub gl_name: String,
    /// Cached GL balance.
    pub gl_balance: Decimal,
    /// `cash_bank_balance - gl_balance`.
    pub difference: Decimal,
    /// When the drift was observed.
    pub detected_at: DateTime<Utc>,
}

/// Result of comparing every active cash/bank account with its GL mirror.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    /// When the check ran.
    pub check_time: DateTime<Utc>,
    /// Accounts compared.
    pub total_accounts: usize,
    /// Accounts in sync.
    pub synchronized_accounts: usize,
    /// Accounts out of sync.
    pub unsynchronized_accounts: usize,
    /// Drifted accounts ordered by code.
    pub discrepancies: Vec<SyncDiscrepancy>,
    /// OK / WARNING / ERROR.
    pub status: SyncStatus,
}

impl SyncReport {
    /// Builds a report from joined cash/bank and GL rows.
    #[must_use]
    pub fn from_rows(rows: &[CashBankGlRow], check_time: DateTime<Utc>) -> Self {
        let mut discrepancies: Vec<SyncDiscrepancy> = rows
            .iter()
            .filter(|row| row.balance != row.gl_balance)
            .map(|row| SyncDiscrepancy {
                cash_bank_id: row.account_id,
                cash_bank_code: row.code.clone(),
                cash_bank_name: row.name.clone(),
                cash_bank_balance: row.balance,
                gl_account_id: row.gl_account_id,
                gl_code: row.gl_code.clone(),
                gl_name: row.gl_name.clone(),
                gl_balance: row.gl_balance,
                difference: row.balance - row.gl_balance,
                detected_at: check_time,
            })
            .collect();
        discrepancies.sort_by(|a, b| a.cash_bank_code.cmp(&b.cash_bank_code));

        Self {
            check_time,
            total_accounts: rows.len(),
            synchronized_accounts: rows.len() - discrepancies.len(),
            unsynchronized_accounts: discrepancies.len(),
            status: SyncStatus::from_count(discrepancies.len()),
            discrepancies,
        }
    }

    /// Largest absolute drift, zero when in sync.
    #[must_use]
    pub fn max_difference(&self) -> Decimal {
        self.discrepancies
            .iter()
            .map(|d| d.difference.abs())
            .max()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Condensed balance health derived from a sync report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHealth {
    /// OK / WARNING / ERROR.
    pub status: SyncStatus,
    /// Accounts compared.
    pub total_accounts: usize,
    /// Accounts in sync.
    pub synchronized_accounts: usize,
    /// Accounts out of sync.
    pub unsynchronized_accounts: usize,
    /// Share of accounts in sync, two decimal places; 100 when there are none.
    pub sync_percentage: Decimal,
    /// Sum of absolute drifts.
    pub total_difference_amount: Decimal,
    /// Largest absolute drift.
    pub max_difference_amount: Decimal,
    /// When the underlying check ran.
    pub last_check_time: DateTime<Utc>,
}

impl From<&SyncReport> for BalanceHealth {
    fn from(report: &SyncReport) -> Self {
        let sync_percentage = if report.total_accounts == 0 {
            Decimal::ONE_HUNDRED
        } else {
            (Decimal::from(report.synchronized_accounts) * Decimal::ONE_HUNDRED
                / Decimal::from(report.total_accounts))
            .round_dp(2)
        };
        Self {
            status: report.status,
            total_accounts: report.total_accounts,
            synchronized_accounts: report.synchronized_accounts,
            unsynchronized_accounts: report.unsynchronized_accounts,
            sync_percentage,
            total_difference_amount: report
                .discrepancies
                .iter()
                .map(|d| d.difference.abs())
                .sum(),
            max_difference_amount: report.max_difference(),
            last_check_time: report.check_time,
        }
    }
}

/// Result of the double-posting detector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoublePostingReport {
    /// When the check ran.
    pub check_time: DateTime<Utc>,
    /// Accounts evaluated.
    pub total_accounts_checked: usize,
    /// Patterns found.
    pub patterns_found: usize,
    /// The flagged accounts.
    pub findings: Vec<Inconsistency>,
    /// Percentage of accounts without the pattern.
    pub health_score: Decimal,
    /// CLEAN / WARNING / CRITICAL.
    pub status: DoublePostingStatus,
}

impl DoublePostingReport {
    /// Builds a report from the double-posting check outcome.
    #[must_use]
    pub fn from_outcome(outcome: CheckOutcome, check_time: DateTime<Utc>) -> Self {
        let patterns_found = outcome.findings.len();
        Self {
            check_time,
            total_accounts_checked: outcome.checked,
            patterns_found,
            health_score: health_score(outcome.checked, patterns_found),
            status: DoublePostingStatus::from_count(patterns_found),
            findings: outcome.findings,
        }
    }
}

/// Post-hoc inspection of one posting on one cash/bank account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingInspection {
    /// Source document id the posting was made for.
    pub reference_id: String,
    /// Cash/bank account inspected.
    pub cash_bank_id: CashBankAccountId,
    /// Ledger lines created for the reference on any account.
    pub transactions_found: usize,
    /// Sum of the reference's lines on this account.
    pub total_amount: Decimal,
    /// Amount the caller expected.
    pub expected_amount: Decimal,
    /// More than one line was created.
    pub multiple_transactions: bool,
    /// `|total - expected| > tolerance`.
    pub amount_mismatch: bool,
    /// The account now shows the double-posting signature.
    pub double_posting_pattern: bool,
    /// When the inspection ran.
    pub inspected_at: DateTime<Utc>,
}

/// Raw observations for a posting inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostingObservation {
    /// Amounts of every line carrying the reference, with their account.
    pub lines: Vec<(CashBankAccountId, Decimal)>,
    /// Current cached balance of the account.
    pub account_balance: Decimal,
    /// Current transaction sum of the account.
    pub account_transaction_sum: Decimal,
}

impl PostingInspection {
    /// Evaluates observations for `reference_id` on `cash_bank_id`.
    #[must_use]
    pub fn evaluate(
        reference_id: &str,
        cash_bank_id: CashBankAccountId,
        expected_amount: Decimal,
        observation: &PostingObservation,
        tolerance: Decimal,
        inspected_at: DateTime<Utc>,
    ) -> Self {
        let total_amount: Decimal = observation
            .lines
            .iter()
            .filter(|(account, _)| *account == cash_bank_id)
            .map(|(_, amount)| *amount)
            .sum();
        Self {
            reference_id: reference_id.to_string(),
            cash_bank_id,
            transactions_found: observation.lines.len(),
            total_amount,
            expected_amount,
            multiple_transactions: observation.lines.len() > 1,
            amount_mismatch: (total_amount - expected_amount).abs() > tolerance,
            double_posting_pattern: is_double_posting(
                observation.account_balance,
                observation.account_transaction_sum,
                tolerance,
            ),
            inspected_at,
        }
    }

    /// True when any indicator fired.
    #[must_use]
    pub fn is_suspicious(&self) -> bool {
        self.multiple_transactions || self.amount_mismatch || self.double_posting_pattern
    }
}

/// Everything a finished monitoring cycle produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    /// When the cycle started.
    pub started_at: DateTime<Utc>,
    /// When the cycle finished.
    pub finished_at: DateTime<Utc>,
    /// CLEAN or DEGRADED.
    pub verdict: CycleState,
    /// Balance sync result.
    pub sync: SyncReport,
    /// Double-posting result.
    pub double_posting: DoublePostingReport,
    /// Auto-fix result, when auto-fix ran and succeeded.
    pub fix: Option<FixSummary>,
    /// Auto-fix failure, when auto-fix ran and was rolled back.
    pub fix_error: Option<String>,
}

/// Snapshot of the monitor's configuration and last cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringStatus {
    /// Whether the periodic worker runs.
    pub enabled: bool,
    /// Current state.
    pub state: CycleState,
    /// Start of the last completed or failed cycle.
    pub last_check: Option<DateTime<Utc>>,
    /// Verdict of the last completed cycle.
    pub last_verdict: Option<CycleState>,
    /// Error of the last failed cycle, cleared by a successful one.
    pub last_error: Option<String>,
    /// Seconds between cycles.
    pub interval_secs: u64,
    /// Auto-fix enabled.
    pub auto_fix: bool,
    /// Drift that escalates an alert to critical.
    pub critical_balance_difference: Decimal,
    /// Drift that escalates an alert to high.
    pub high_balance_difference: Decimal,
    /// Findings tolerated before escalating.
    pub max_tolerable_inconsistencies: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gl_row(code: &str, balance: Decimal, gl_balance: Decimal) -> CashBankGlRow {
        CashBankGlRow {
            account_id: CashBankAccountId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            balance,
            gl_account_id: GlAccountId::new(),
            gl_code: format!("11-{code}"),
            gl_name: format!("GL {code}"),
            gl_balance,
        }
    }

    #[test]
    fn test_sync_report_and_health() {
        let rows = vec![
            gl_row("CB-003", dec!(100), dec!(100)),
            gl_row("CB-002", dec!(100), dec!(300)),
            gl_row("CB-001", dec!(500), dec!(450)),
            gl_row("CB-004", dec!(0), dec!(0)),
        ];
        let report = SyncReport::from_rows(&rows, Utc::now());

        assert_eq!(report.total_accounts, 4);
        assert_eq!(report.unsynchronized_accounts, 2);
        assert_eq!(report.status, SyncStatus::Warning);
        assert_eq!(report.discrepancies[0].cash_bank_code, "CB-001");
        assert_eq!(report.discrepancies[0].difference, dec!(50));
        assert_eq!(report.discrepancies[1].difference, dec!(-200));

        let health = BalanceHealth::from(&report);
        assert_eq!(health.sync_percentage, dec!(50));
        assert_eq!(health.total_difference_amount, dec!(250));
        assert_eq!(health.max_difference_amount, dec!(200));
    }

    #[test]
    fn test_health_with_no_accounts() {
        let report = SyncReport::from_rows(&[], Utc::now());
        let health = BalanceHealth::from(&report);
        assert_eq!(report.status, SyncStatus::Ok);
        assert_eq!(health.sync_percentage, dec!(100));
        assert_eq!(health.max_difference_amount, Decimal::ZERO);
    }

    #[test]
    fn test_posting_inspection() {
        let account = CashBankAccountId::new();
        let other = CashBankAccountId::new();
        let observation = PostingObservation {
            lines: vec![(account, dec!(250)), (account, dec!(250)), (other, dec!(-250))],
            account_balance: dec!(500),
            account_transaction_sum: dec!(250),
        };
        let inspection = PostingInspection::evaluate(
            "PAY-77",
            account,
            dec!(250),
            &observation,
            dec!(0.01),
            Utc::now(),
        );

        assert_eq!(inspection.transactions_found, 3);
        assert_eq!(inspection.total_amount, dec!(500));
        assert!(inspection.multiple_transactions);
        assert!(inspection.amount_mismatch);
        assert!(inspection.double_posting_pattern);
        assert!(inspection.is_suspicious());
    }

    #[test]
    fn test_clean_posting_inspection() {
        let account = CashBankAccountId::new();
        let observation = PostingObservation {
            lines: vec![(account, dec!(-75.10))],
            account_balance: dec!(924.90),
            account_transaction_sum: dec!(924.90),
        };
        let inspection = PostingInspection::evaluate(
            "PAY-78",
            account,
            dec!(-75.10),
            &observation,
            dec!(0.01),
            Utc::now(),
        );
        assert!(!inspection.is_suspicious());
    }
}
