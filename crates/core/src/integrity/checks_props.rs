//! Property-based tests for the balance integrity checks.

use chrono::Utc;
use ledgerwatch_shared::types::{CashBankAccountId, GlAccountId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::checks::{
    DEFAULT_TOLERANCE, check_double_posting, check_transaction_sums, is_double_posting,
};
use super::severity::{Severity, SeverityThresholds};
use super::types::{CashBankSumRow, CheckKind, ValidationReport};

/// Strategy for a two-decimal amount between -1,000,000.00 and 1,000,000.00.
fn amount() -> impl Strategy<Value = Decimal> {
    (-100_000_000i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for a strictly positive two-decimal amount.
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn row(code: usize, balance: Decimal, transaction_sum: Decimal) -> CashBankSumRow {
    CashBankSumRow {
        account_id: CashBankAccountId::new(),
        code: format!("CB-{code:03}"),
        name: format!("Account {code}"),
        gl_account_id: GlAccountId::new(),
        balance,
        transaction_sum,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// An account whose balance equals its transaction sum never produces a finding.
    #[test]
    fn prop_consistent_accounts_pass(sums in prop::collection::vec(amount(), 0..20)) {
        let rows: Vec<_> = sums.iter().enumerate().map(|(i, s)| row(i, *s, *s)).collect();
        let outcome = check_transaction_sums(&rows, &SeverityThresholds::default());
        prop_assert_eq!(outcome.checked, rows.len());
        prop_assert!(outcome.findings.is_empty());
    }

    /// A doubled positive balance is always flagged.
    #[test]
    fn prop_doubled_balance_flagged(sum in positive_amount()) {
        prop_assert!(is_double_posting(sum * Decimal::TWO, sum, DEFAULT_TOLERANCE));
    }

    /// A balance of 1.5x the sum is never flagged.
    #[test]
    fn prop_one_and_a_half_not_flagged(cents in 2i64..100_000_000i64) {
        let sum = Decimal::new(cents * 2, 2);
        let balance = Decimal::new(cents * 3, 2);
        prop_assert!(!is_double_posting(balance, sum, DEFAULT_TOLERANCE));
    }

    /// Severity never decreases as the delta grows.
    #[test]
    fn prop_severity_monotonic(a in amount(), b in amount()) {
        let thresholds = SeverityThresholds::default();
        let (small, large) = if a.abs() <= b.abs() { (a, b) } else { (b, a) };
        prop_assert!(
            thresholds.classify(small, Severity::Low) <= thresholds.classify(large, Severity::Low)
        );
    }

    /// Assembling the same outcomes twice gives the same findings.
    #[test]
    fn prop_report_is_idempotent(pairs in prop::collection::vec((amount(), amount()), 0..15)) {
        let rows: Vec<_> = pairs.iter().enumerate().map(|(i, (b, s))| row(i, *b, *s)).collect();
        let thresholds = SeverityThresholds::default();
        let build = || ValidationReport::assemble(
            vec![
                (CheckKind::CashBankTransaction, Ok(check_transaction_sums(&rows, &thresholds))),
                (CheckKind::DoublePosting, Ok(check_double_posting(&rows, DEFAULT_TOLERANCE))),
            ],
            Utc::now(),
            0,
        );
        let first = build();
        let second = build();
        prop_assert!(first.same_findings(&second));
        prop_assert_eq!(first.total_checks, rows.len() * 2);
        prop_assert!(first.failed_checks <= first.total_checks);
    }
}
