//! Snapshot comparison.

use std::collections::HashMap;

use chrono::SecondsFormat;
use ledgerwatch_shared::types::CashBankTransactionId;
use rust_decimal::Decimal;

use super::types::{
    Difference, DifferenceType, FrozenTransaction, ReconciliationSummary, SnapshotContent,
};

/// Compares two snapshots' transactions by original transaction id.
///
/// Passes run in a fixed order: MISSING, then ADDED, then AMOUNT_CHANGE and
/// DATE_CHANGE per shared id. Within each pass the snapshot's own `(date, id)`
/// order is kept, so the output is deterministic.
#[must_use]
pub fn compare(base: &[FrozenTransaction], comparison: &[FrozenTransaction]) -> Vec<Difference> {
    let base_map: HashMap<CashBankTransactionId, &FrozenTransaction> =
        base.iter().map(|tx| (tx.transaction_id, tx)).collect();
    let comparison_map: HashMap<CashBankTransactionId, &FrozenTransaction> =
        comparison.iter().map(|tx| (tx.transaction_id, tx)).collect();

    let mut differences = Vec::new();

    for tx in base {
        if !comparison_map.contains_key(&tx.transaction_id) {
            differences.push(Difference {
                difference_type: DifferenceType::Missing,
                severity: DifferenceType::Missing.severity(),
                base_transaction_id: Some(tx.transaction_id),
                current_transaction_id: None,
                field: None,
                old_value: Some(tx.amount.to_string()),
                new_value: None,
                amount_difference: Decimal::ZERO,
                description: format!("Transaction {} missing in current data", tx.transaction_id),
            });
        }
    }

    for tx in comparison {
        if !base_map.contains_key(&tx.transaction_id) {
            differences.push(Difference {
                difference_type: DifferenceType::Added,
                severity: DifferenceType::Added.severity(),
                base_transaction_id: None,
                current_transaction_id: Some(tx.transaction_id),
                field: None,
                old_value: None,
                new_value: Some(tx.amount.to_string()),
                amount_difference: Decimal::ZERO,
                description: format!("Transaction {} added after snapshot", tx.transaction_id),
            });
        }
    }

    for before in base {
        let Some(after) = comparison_map.get(&before.transaction_id) else {
            continue;
        };

        if before.amount != after.amount {
            differences.push(Difference {
                difference_type: DifferenceType::AmountChange,
                severity: DifferenceType::AmountChange.severity(),
                base_transaction_id: Some(before.transaction_id),
                current_transaction_id: Some(after.transaction_id),
                field: Some("amount".to_string()),
                old_value: Some(before.amount.to_string()),
                new_value: Some(after.amount.to_string()),
                amount_difference: after.amount - before.amount,
                description: format!("Amount changed for transaction {}", before.transaction_id),
            });
        }

        if before.transaction_date != after.transaction_date {
            differences.push(Difference {
                difference_type: DifferenceType::DateChange,
                severity: DifferenceType::DateChange.severity(),
                base_transaction_id: Some(before.transaction_id),
                current_transaction_id: Some(after.transaction_id),
                field: Some("transaction_date".to_string()),
                old_value: Some(before.transaction_date.to_rfc3339_opts(SecondsFormat::Secs, true)),
                new_value: Some(after.transaction_date.to_rfc3339_opts(SecondsFormat::Secs, true)),
                amount_difference: Decimal::ZERO,
                description: format!(
                    "Transaction date changed for transaction {}",
                    before.transaction_id
                ),
            });
        }
    }

    differences
}

impl ReconciliationSummary {
    /// Computes variances, per-kind counts and the balance verdict.
    ///
    /// Balanced means: closing balance variance is exactly zero, transaction
    /// count variance is exactly zero and `differences` is empty.
    #[must_use]
    pub fn from_snapshots(
        base: &SnapshotContent,
        comparison: &SnapshotContent,
        differences: &[Difference],
    ) -> Self {
        let base_count = i64::try_from(base.transaction_count).unwrap_or(i64::MAX);
        let current_count = i64::try_from(comparison.transaction_count).unwrap_or(i64::MAX);
        let variance = comparison.closing_balance - base.closing_balance;
        let transaction_variance = current_count - base_count;

        let count = |kind: DifferenceType| {
            differences
                .iter()
                .filter(|d| d.difference_type == kind)
                .count()
        };
        let mut modified: Vec<CashBankTransactionId> = differences
            .iter()
            .filter(|d| {
                matches!(
                    d.difference_type,
                    DifferenceType::AmountChange | DifferenceType::DateChange
                )
            })
            .filter_map(|d| d.base_transaction_id)
            .collect();
        modified.sort_by_key(|id| id.into_inner());
        modified.dedup();

        Self {
            base_balance: base.closing_balance,
            current_balance: comparison.closing_balance,
            variance,
            base_transaction_count: base_count,
            current_transaction_count: current_count,
            transaction_variance,
            missing_transactions: count(DifferenceType::Missing),
            added_transactions: count(DifferenceType::Added),
            modified_transactions: modified.len(),
            is_balanced: variance.is_zero() && transaction_variance == 0 && differences.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::Severity;
    use crate::reconciliation::period::Period;
    use crate::reconciliation::types::LedgerTransaction;
    use chrono::{Duration, TimeZone, Utc};
    use ledgerwatch_shared::types::CashBankAccountId;
    use rust_decimal_macros::dec;

    fn ledger_tx(id: CashBankTransactionId, day: u32, amount: Decimal) -> LedgerTransaction {
        LedgerTransaction {
            id,
            transaction_date: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
            reference_type: "DEPOSIT".to_string(),
            reference_id: None,
            amount,
            balance_after: amount,
            notes: None,
        }
    }

    fn content(account: CashBankAccountId, txs: &[LedgerTransaction]) -> SnapshotContent {
        SnapshotContent::build(account, Period::parse("2024-01").unwrap(), Decimal::ZERO, txs)
    }

    #[test]
    fn test_missing_and_added_only() {
        let account = CashBankAccountId::new();
        let t1 = CashBankTransactionId::new();
        let t2 = CashBankTransactionId::new();
        let t3 = CashBankTransactionId::new();
        let base = content(account, &[ledger_tx(t1, 1, dec!(100)), ledger_tx(t2, 2, dec!(-50))]);
        let comparison = content(account, &[ledger_tx(t1, 1, dec!(100)), ledger_tx(t3, 3, dec!(30))]);

        let diffs = compare(&base.transactions, &comparison.transactions);

        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].difference_type, DifferenceType::Missing);
        assert_eq!(diffs[0].severity, Severity::High);
        assert_eq!(diffs[0].base_transaction_id, Some(t2));
        assert_eq!(diffs[1].difference_type, DifferenceType::Added);
        assert_eq!(diffs[1].severity, Severity::Medium);
        assert_eq!(diffs[1].current_transaction_id, Some(t3));
        assert!(diffs.iter().all(|d| !matches!(
            d.difference_type,
            DifferenceType::AmountChange | DifferenceType::DateChange
        )));

        let summary = ReconciliationSummary::from_snapshots(&base, &comparison, &diffs);
        assert_eq!(summary.variance, dec!(80));
        assert_eq!(summary.transaction_variance, 0);
        assert_eq!(summary.missing_transactions, 1);
        assert_eq!(summary.added_transactions, 1);
        assert!(!summary.is_balanced);
    }

    #[test]
    fn test_one_id_can_change_amount_and_date() {
        let account = CashBankAccountId::new();
        let t1 = CashBankTransactionId::new();
        let before = ledger_tx(t1, 4, dec!(100));
        let mut after = before.clone();
        after.amount = dec!(120);
        after.transaction_date += Duration::days(1);

        let base = content(account, &[before]);
        let comparison = content(account, &[after]);
        let diffs = compare(&base.transactions, &comparison.transactions);

        assert_eq!(diffs.len(), 2);
        assert_eq!(diffs[0].difference_type, DifferenceType::AmountChange);
        assert_eq!(diffs[0].severity, Severity::Critical);
        assert_eq!(diffs[0].amount_difference, dec!(20));
        assert_eq!(diffs[0].old_value.as_deref(), Some("100"));
        assert_eq!(diffs[0].new_value.as_deref(), Some("120"));
        assert_eq!(diffs[1].difference_type, DifferenceType::DateChange);
        assert_eq!(diffs[1].severity, Severity::High);
        assert_eq!(diffs[1].old_value.as_deref(), Some("2024-01-04T12:00:00Z"));

        let summary = ReconciliationSummary::from_snapshots(&base, &comparison, &diffs);
        assert_eq!(summary.modified_transactions, 1);
        assert_eq!(summary.missing_transactions, 0);
    }

    #[test]
    fn test_identical_snapshots_are_balanced() {
        let account = CashBankAccountId::new();
        let txs = vec![
            ledger_tx(CashBankTransactionId::new(), 1, dec!(500)),
            ledger_tx(CashBankTransactionId::new(), 2, dec!(-125.25)),
        ];
        let base = content(account, &txs);
        let comparison = content(account, &txs);
        let diffs = compare(&base.transactions, &comparison.transactions);

        assert!(diffs.is_empty());
        let summary = ReconciliationSummary::from_snapshots(&base, &comparison, &diffs);
        assert!(summary.is_balanced);
        assert_eq!(summary.base_balance, dec!(374.75));
    }

    #[test]
    fn test_opening_balance_shift_is_not_balanced() {
        let account = CashBankAccountId::new();
        let txs = vec![ledger_tx(CashBankTransactionId::new(), 1, dec!(10))];
        let base = content(account, &txs);
        let comparison = SnapshotContent::build(
            account,
            Period::parse("2024-01").unwrap(),
            dec!(5),
            &txs,
        );
        let diffs = compare(&base.transactions, &comparison.transactions);

        assert!(diffs.is_empty());
        assert!(!ReconciliationSummary::from_snapshots(&base, &comparison, &diffs).is_balanced);
    }
}
