//! Accounting equation auto-heal against a real database.
//!
//! Auto-heal rewrites every GL account, so tests in this file take a shared
//! lock and assert only on the accounts they created. Tests skip when no
//! database is reachable.

mod common;

use common::{TestGlAccount, connect, create_gl_account, unique_code};
use ledgerwatch_core::equation::{HealAction, HealOptions};
use ledgerwatch_db::entities::{gl_accounts, sea_orm_active_enums::GlAccountType};
use ledgerwatch_db::repositories::EquationRepository;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tokio::sync::Mutex;

static SERIAL: Mutex<()> = Mutex::const_new(());

fn options(retained_earnings_code: &str, summary_codes: Vec<String>) -> HealOptions {
    HealOptions {
        close_net_income: true,
        retained_earnings_code: retained_earnings_code.to_string(),
        retained_earnings_name: "Retained Earnings".to_string(),
        summary_codes,
    }
}

async fn balance(db: &DatabaseConnection, account: &TestGlAccount) -> Decimal {
    gl_accounts::Entity::find_by_id(account.id.into_inner())
        .one(db)
        .await
        .unwrap()
        .unwrap()
        .balance
}

#[tokio::test]
async fn test_auto_heal_closes_net_income_and_zeroes_headers() {
    let Some(db) = connect().await else { return };
    let _serial = SERIAL.lock().await;

    let revenue = create_gl_account(&db, GlAccountType::Revenue, dec!(500), false, true)
        .await
        .unwrap();
    let expense = create_gl_account(&db, GlAccountType::Expense, dec!(200), false, true)
        .await
        .unwrap();
    let header = create_gl_account(&db, GlAccountType::Asset, dec!(1000), true, true)
        .await
        .unwrap();
    let summary = create_gl_account(&db, GlAccountType::Liability, dec!(50), false, true)
        .await
        .unwrap();
    // Left unbalanced so the pass cannot end valid.
    let stray = create_gl_account(&db, GlAccountType::Asset, dec!(123.45), false, true)
        .await
        .unwrap();

    let retained_code = unique_code("R");
    let options = options(&retained_code, vec![summary.code.clone()]);
    let repo = EquationRepository::new(db.clone(), dec!(0.01), options.clone());

    let outcome = repo.auto_heal(&options).await.unwrap();
    let net_income = outcome.before.net_income;

    assert!(outcome.actions.contains(&HealAction::CreatedRetainedEarnings {
        code: retained_code.clone()
    }));
    assert!(outcome.actions.iter().any(|action| matches!(
        action,
        HealAction::ClosedNetIncome { amount, into, .. }
            if *amount == net_income && *into == retained_code
    )));
    assert!(outcome.actions.contains(&HealAction::ZeroedAccount {
        code: header.code.clone(),
        previous_balance: dec!(1000),
    }));
    assert!(outcome.actions.contains(&HealAction::ZeroedAccount {
        code: summary.code.clone(),
        previous_balance: dec!(50),
    }));

    let retained = gl_accounts::Entity::find()
        .filter(gl_accounts::Column::Code.eq(retained_code.as_str()))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(retained.account_type, GlAccountType::Equity);
    assert!(retained.is_active);
    assert_eq!(retained.balance, net_income);

    assert_eq!(balance(&db, &revenue).await, Decimal::ZERO);
    assert_eq!(balance(&db, &expense).await, Decimal::ZERO);
    assert_eq!(balance(&db, &header).await, Decimal::ZERO);
    assert_eq!(balance(&db, &summary).await, Decimal::ZERO);
    assert_eq!(balance(&db, &stray).await, dec!(123.45));
    assert_eq!(outcome.after.net_income, Decimal::ZERO);

    assert!(outcome.diagnostics.iter().any(|diagnostic| {
        diagnostic.contains(&summary.code) && diagnostic.contains("summary code list")
    }));
    assert!(!outcome.after.is_valid);
    assert!(outcome.diagnostics.iter().any(|diagnostic| {
        diagnostic.starts_with("Accounting equation still out of balance by")
    }));
}

#[tokio::test]
async fn test_auto_heal_skips_close_into_inactive_retained_earnings() {
    let Some(db) = connect().await else { return };
    let _serial = SERIAL.lock().await;

    let revenue = create_gl_account(&db, GlAccountType::Revenue, dec!(80), false, true)
        .await
        .unwrap();
    let retained = create_gl_account(&db, GlAccountType::Equity, Decimal::ZERO, false, false)
        .await
        .unwrap();

    let options = options(&retained.code, Vec::new());
    let repo = EquationRepository::new(db.clone(), dec!(0.01), options.clone());

    let outcome = repo.auto_heal(&options).await.unwrap();

    assert!(
        !outcome
            .actions
            .iter()
            .any(|action| matches!(action, HealAction::ClosedNetIncome { .. }))
    );
    assert!(outcome.diagnostics.contains(&format!(
        "Retained earnings account {} is inactive; net income was not closed",
        retained.code
    )));
    assert_eq!(balance(&db, &revenue).await, dec!(80));
    assert_eq!(balance(&db, &retained).await, Decimal::ZERO);
    assert!(
        !outcome
            .actions
            .iter()
            .any(|action| matches!(action, HealAction::CreatedRetainedEarnings { .. }))
    );
}
