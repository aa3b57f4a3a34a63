//! Snapshot construction and content hashing.

use chrono::SecondsFormat;
use ledgerwatch_shared::types::CashBankAccountId;
use rust_decimal::Decimal;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::ReconciliationError;
use super::period::Period;
use super::types::{FrozenTransaction, LedgerTransaction, SnapshotContent};

impl SnapshotContent {
    /// Builds snapshot content from the period's transactions.
    ///
    /// Transactions are re-ordered by `(date, id)`. The closing balance is
    /// derived from the opening balance and the period totals; the cached
    /// account balance plays no part.
    #[must_use]
    pub fn build(
        account_id: CashBankAccountId,
        period: Period,
        opening_balance: Decimal,
        transactions: &[LedgerTransaction],
    ) -> Self {
        let mut frozen: Vec<FrozenTransaction> =
            transactions.iter().map(FrozenTransaction::from).collect();
        frozen.sort_by(|a, b| {
            a.transaction_date
                .cmp(&b.transaction_date)
                .then_with(|| a.transaction_id.into_inner().cmp(&b.transaction_id.into_inner()))
        });

        let total_debit: Decimal = frozen.iter().map(|tx| tx.debit_amount).sum();
        let total_credit: Decimal = frozen.iter().map(|tx| tx.credit_amount).sum();

        Self {
            account_id,
            period,
            opening_balance,
            closing_balance: opening_balance + total_debit - total_credit,
            total_debit,
            total_credit,
            transaction_count: frozen.len(),
            transactions: frozen,
        }
    }

    /// SHA-256 over the canonical JSON form, as lowercase hex.
    ///
    /// Decimals are normalized (so `100` and `100.00` hash alike) and dates
    /// are RFC 3339 UTC with microseconds. Creation timestamps are not part
    /// of the content, so equal ledgers hash equally.
    pub fn content_hash(&self) -> Result<String, ReconciliationError> {
        let input = HashInput {
            account_id: self.account_id.to_string(),
            period: self.period.to_string(),
            opening_balance: canonical(self.opening_balance),
            closing_balance: canonical(self.closing_balance),
            total_debit: canonical(self.total_debit),
            total_credit: canonical(self.total_credit),
            transaction_count: self.transaction_count,
            transactions: self
                .transactions
                .iter()
                .map(|tx| HashLine {
                    transaction_id: tx.transaction_id.to_string(),
                    transaction_date: tx
                        .transaction_date
                        .to_rfc3339_opts(SecondsFormat::Micros, true),
                    reference_type: &tx.reference_type,
                    reference_id: tx.reference_id.as_deref(),
                    amount: canonical(tx.amount),
                    balance_after: canonical(tx.balance_after),
                    notes: tx.notes.as_deref(),
                })
                .collect(),
        };

        let bytes = serde_json::to_vec(&input)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    /// Recomputes the hash and compares it with `stored`.
    pub fn verify_hash(&self, stored: &str) -> Result<bool, ReconciliationError> {
        Ok(self.content_hash()? == stored)
    }
}

fn canonical(value: Decimal) -> String {
    value.normalize().to_string()
}

#[derive(Serialize)]
struct HashInput<'a> {
    account_id: String,
    period: String,
    opening_balance: String,
    closing_balance: String,
    total_debit: String,
    total_credit: String,
    transaction_count: usize,
    transactions: Vec<HashLine<'a>>,
}

#[derive(Serialize)]
struct HashLine<'a> {
    transaction_id: String,
    transaction_date: String,
    reference_type: &'a str,
    reference_id: Option<&'a str>,
    amount: String,
    balance_after: String,
    notes: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ledgerwatch_shared::types::CashBankTransactionId;
    use rust_decimal_macros::dec;

    fn tx(day: u32, amount: Decimal, balance_after: Decimal) -> LedgerTransaction {
        LedgerTransaction {
            id: CashBankTransactionId::new(),
            transaction_date: Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap(),
            reference_type: "PAYMENT".to_string(),
            reference_id: Some(format!("PAY-{day}")),
            amount,
            balance_after,
            notes: None,
        }
    }

    fn period() -> Period {
        Period::parse("2024-03").unwrap()
    }

    #[test]
    fn test_build_derives_totals() {
        let account = CashBankAccountId::new();
        let txs = vec![
            tx(5, dec!(250), dec!(1250)),
            tx(2, dec!(-100), dec!(900)),
            tx(9, dec!(40.50), dec!(1290.50)),
        ];
        let content = SnapshotContent::build(account, period(), dec!(1000), &txs);

        assert_eq!(content.total_debit, dec!(290.50));
        assert_eq!(content.total_credit, dec!(100));
        assert_eq!(content.closing_balance, dec!(1190.50));
        assert_eq!(content.transaction_count, 3);
        assert_eq!(content.transactions[0].amount, dec!(-100));
        assert_eq!(content.transactions[0].credit_amount, dec!(100));
        assert_eq!(content.transactions[0].debit_amount, Decimal::ZERO);
    }

    #[test]
    fn test_empty_period_carries_opening_balance() {
        let content = SnapshotContent::build(CashBankAccountId::new(), period(), dec!(75), &[]);
        assert_eq!(content.closing_balance, dec!(75));
        assert_eq!(content.transaction_count, 0);
    }

    #[test]
    fn test_hash_is_deterministic_and_order_independent() {
        let account = CashBankAccountId::new();
        let txs = vec![tx(1, dec!(100), dec!(100)), tx(2, dec!(-50), dec!(50))];
        let reversed: Vec<_> = txs.iter().rev().cloned().collect();

        let first = SnapshotContent::build(account, period(), Decimal::ZERO, &txs);
        let second = SnapshotContent::build(account, period(), Decimal::ZERO, &reversed);

        let hash = first.content_hash().unwrap();
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, second.content_hash().unwrap());
        assert!(second.verify_hash(&hash).unwrap());
    }

    #[test]
    fn test_hash_ignores_decimal_scale() {
        let account = CashBankAccountId::new();
        let mut txs = vec![tx(1, dec!(100), dec!(100))];
        let plain = SnapshotContent::build(account, period(), Decimal::ZERO, &txs);
        txs[0].amount = dec!(100.00);
        txs[0].balance_after = dec!(100.00);
        let scaled = SnapshotContent::build(account, period(), dec!(0.00), &txs);

        assert_eq!(plain.content_hash().unwrap(), scaled.content_hash().unwrap());
    }

    #[test]
    fn test_hash_detects_tampering() {
        let account = CashBankAccountId::new();
        let txs = vec![tx(1, dec!(100), dec!(100))];
        let content = SnapshotContent::build(account, period(), Decimal::ZERO, &txs);
        let hash = content.content_hash().unwrap();

        let mut tampered = content.clone();
        tampered.transactions[0].amount = dec!(101);
        assert!(!tampered.verify_hash(&hash).unwrap());

        let mut renoted = content;
        renoted.transactions[0].notes = Some("edited".to_string());
        assert!(!renoted.verify_hash(&hash).unwrap());
    }
}
