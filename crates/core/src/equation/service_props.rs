//! Property-based tests for equation evaluation and heal planning.

use chrono::Utc;
use ledgerwatch_shared::types::GlAccountId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::{plan_close, plan_header_zeroing};
use super::types::{AccountType, EquationReport, EquationTotals, GlAccountBalance};
use crate::integrity::DEFAULT_TOLERANCE;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Asset),
        Just(AccountType::Liability),
        Just(AccountType::Equity),
        Just(AccountType::Revenue),
        Just(AccountType::Expense),
    ]
}

fn books() -> impl Strategy<Value = Vec<GlAccountBalance>> {
    prop::collection::vec((account_type(), amount(), any::<bool>()), 1..25).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (account_type, balance, is_header))| GlAccountBalance {
                id: GlAccountId::new(),
                code: format!("{i:04}"),
                name: format!("Account {i}"),
                account_type,
                balance,
                is_header,
                is_active: true,
            })
            .collect()
    })
}

/// Applies a close plan the way the persistence layer does.
fn apply_close(accounts: &mut Vec<GlAccountBalance>, code: &str) {
    let Ok(Some(plan)) = plan_close(accounts, code) else {
        return;
    };
    for account in accounts.iter_mut() {
        if plan.close_accounts.contains(&account.id) {
            account.balance = Decimal::ZERO;
        }
    }
    match plan.retained_earnings {
        Some(id) => {
            if let Some(account) = accounts.iter_mut().find(|a| a.id == id) {
                account.balance += plan.net_income;
            }
        }
        None => accounts.push(GlAccountBalance {
            id: GlAccountId::new(),
            code: code.to_string(),
            name: "Retained Earnings".to_string(),
            account_type: AccountType::Equity,
            balance: plan.net_income,
            is_header: false,
            is_active: true,
        }),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Closing net income never changes the equation difference.
    #[test]
    fn prop_close_preserves_diff(mut accounts in books()) {
        let before = EquationReport::evaluate(
            EquationTotals::from_accounts(&accounts), DEFAULT_TOLERANCE, Utc::now());
        apply_close(&mut accounts, "3201");
        let after = EquationReport::evaluate(
            EquationTotals::from_accounts(&accounts), DEFAULT_TOLERANCE, Utc::now());

        prop_assert_eq!(before.diff, after.diff);
        prop_assert_eq!(after.net_income, Decimal::ZERO);
        prop_assert!(matches!(plan_close(&accounts, "3201"), Ok(None)));
    }

    /// An inactive retained earnings account blocks the close and leaves the books untouched.
    #[test]
    fn prop_inactive_retained_earnings_blocks_close(mut accounts in books()) {
        accounts[0].is_active = false;
        let code = accounts[0].code.clone();
        let before = accounts.clone();
        apply_close(&mut accounts, &code);

        prop_assert_eq!(accounts, before);
    }

    /// Zeroing header accounts is idempotent.
    #[test]
    fn prop_header_zeroing_idempotent(mut accounts in books()) {
        let codes = vec!["0000".to_string(), "0003".to_string()];
        let targets = plan_header_zeroing(&accounts, &codes);
        for account in &mut accounts {
            if targets.iter().any(|t| t.id == account.id) {
                account.balance = Decimal::ZERO;
            }
        }
        prop_assert!(plan_header_zeroing(&accounts, &codes).is_empty());
    }
}
