//! The four balance integrity check passes.
//!
//! Each pass is a pure function over rows loaded by the persistence layer.
//! Findings come back sorted by account code (or entry number) so a report
//! built from them is stable across runs.

use rust_decimal::Decimal;

use super::severity::{Severity, SeverityThresholds};
use super::types::{
    BalanceFinding, CashBankGlRow, CashBankSumRow, CheckOutcome, Inconsistency, JournalFinding,
    JournalTotalsRow,
};

/// Default rounding tolerance for journal and double-posting checks.
pub const DEFAULT_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Compares each cached cash/bank balance with the sum of its transactions.
///
/// Any non-zero delta is a finding. Minor deltas grade as LOW.
#[must_use]
pub fn check_transaction_sums(
    rows: &[CashBankSumRow],
    thresholds: &SeverityThresholds,
) -> CheckOutcome {
    let mut findings: Vec<BalanceFinding> = rows
        .iter()
        .filter(|row| row.balance != row.transaction_sum)
        .map(|row| {
            let difference = row.balance - row.transaction_sum;
            BalanceFinding {
                account_id: row.account_id,
                account_code: row.code.clone(),
                account_name: row.name.clone(),
                gl_account_id: row.gl_account_id,
                expected: row.transaction_sum,
                actual: row.balance,
                difference,
                severity: thresholds.classify(difference, Severity::Low),
                description: format!(
                    "Cash/bank {} balance {} does not match transaction sum {}",
                    row.name, row.balance, row.transaction_sum
                ),
            }
        })
        .collect();

    sort_by_account(&mut findings);
    CheckOutcome {
        checked: rows.len(),
        findings: findings
            .into_iter()
            .map(Inconsistency::TransactionMismatch)
            .collect(),
    }
}

/// Compares each cash/bank balance with its linked GL account.
///
/// The cash/bank side is authoritative, so `expected` is the cash/bank
/// balance and `difference` is `gl - cash`. Minor deltas grade as MEDIUM.
#[must_use]
pub fn check_gl_mirror(rows: &[CashBankGlRow], thresholds: &SeverityThresholds) -> CheckOutcome {
    let mut findings: Vec<BalanceFinding> = rows
        .iter()
        .filter(|row| row.balance != row.gl_balance)
        .map(|row| {
            let difference = row.gl_balance - row.balance;
            BalanceFinding {
                account_id: row.account_id,
                account_code: row.code.clone(),
                account_name: row.name.clone(),
                gl_account_id: row.gl_account_id,
                expected: row.balance,
                actual: row.gl_balance,
                difference,
                severity: thresholds.classify(difference, Severity::Medium),
                description: format!(
                    "Cash/bank {} balance {} does not match GL account {} balance {}",
                    row.name, row.balance, row.gl_code, row.gl_balance
                ),
            }
        })
        .collect();

    sort_by_account(&mut findings);
    CheckOutcome {
        checked: rows.len(),
        findings: findings.into_iter().map(Inconsistency::GlMismatch).collect(),
    }
}

/// Flags posted entries whose debits and credits differ by more than `tolerance`.
///
/// Always CRITICAL: a broken double-entry invariant is never downgraded.
#[must_use]
pub fn check_journal_balance(rows: &[JournalTotalsRow], tolerance: Decimal) -> CheckOutcome {
    let mut findings: Vec<JournalFinding> = rows
        .iter()
        .filter(|row| (row.total_debit - row.total_credit).abs() > tolerance)
        .map(|row| JournalFinding {
            entry_id: row.entry_id,
            entry_number: row.entry_number.clone(),
            total_debit: row.total_debit,
            total_credit: row.total_credit,
            difference: row.total_debit - row.total_credit,
            severity: Severity::Critical,
            description: format!(
                "Journal {} is not balanced (debit {}, credit {})",
                row.entry_number, row.total_debit, row.total_credit
            ),
        })
        .collect();

    findings.sort_by(|a, b| {
        a.entry_number
            .cmp(&b.entry_number)
            .then_with(|| a.entry_id.into_inner().cmp(&b.entry_id.into_inner()))
    });
    CheckOutcome {
        checked: rows.len(),
        findings: findings
            .into_iter()
            .map(Inconsistency::UnbalancedJournal)
            .collect(),
    }
}

/// Returns true when a positive balance is twice the transaction sum.
#[must_use]
pub fn is_double_posting(balance: Decimal, transaction_sum: Decimal, tolerance: Decimal) -> bool {
    balance > Decimal::ZERO && (balance - transaction_sum * Decimal::TWO).abs() < tolerance
}

/// Flags accounts matching the double-posting signature. Always CRITICAL.
///
/// This is a detector, not an invariant: the same rows may also trip
/// [`check_transaction_sums`], and a false positive here never blocks
/// anything on its own.
#[must_use]
pub fn check_double_posting(rows: &[CashBankSumRow], tolerance: Decimal) -> CheckOutcome {
    let mut findings: Vec<BalanceFinding> = rows
        .iter()
        .filter(|row| is_double_posting(row.balance, row.transaction_sum, tolerance))
        .map(|row| BalanceFinding {
            account_id: row.account_id,
            account_code: row.code.clone(),
            account_name: row.name.clone(),
            gl_account_id: row.gl_account_id,
            expected: row.transaction_sum,
            actual: row.balance,
            difference: row.balance - row.transaction_sum,
            severity: Severity::Critical,
            description: format!(
                "Account {} shows a double posting pattern (balance {} is 2x transaction sum {})",
                row.name, row.balance, row.transaction_sum
            ),
        })
        .collect();

    sort_by_account(&mut findings);
    CheckOutcome {
        checked: rows.len(),
        findings: findings
            .into_iter()
            .map(Inconsistency::DoublePostingPattern)
            .collect(),
    }
}

fn sort_by_account(findings: &mut [BalanceFinding]) {
    findings.sort_by(|a, b| {
        a.account_code
            .cmp(&b.account_code)
            .then_with(|| a.account_id.into_inner().cmp(&b.account_id.into_inner()))
    });
}
