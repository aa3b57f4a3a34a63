//! Corrective write path and posting inspection against a real database.
//!
//! Tests skip when no database is reachable.

mod common;

use std::sync::{Arc, Mutex};

use common::{add_transaction, connect, create_account, day};
use ledgerwatch_core::monitoring::{Alert, AlertLevel, AlertPolicy, AlertSink, Correction, FixError};
use ledgerwatch_db::entities::{
    cash_bank_accounts, cash_bank_audit_trail, cash_bank_transactions, gl_accounts,
};
use ledgerwatch_db::repositories::{
    BALANCE_CORRECTION, CorrectionContext, CorrectionError, CorrectionExecutor,
    MonitoringRepository,
};
use ledgerwatch_shared::types::UserId;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

#[derive(Default)]
struct RecordingSink {
    alerts: Mutex<Vec<Alert>>,
}

impl AlertSink for RecordingSink {
    fn emit(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

fn context() -> CorrectionContext {
    CorrectionContext {
        actor: Some(UserId::new()),
        reason: "Integration test".to_string(),
    }
}

async fn balances(db: &DatabaseConnection, account: &common::TestAccount) -> (Decimal, Decimal) {
    let cash = cash_bank_accounts::Entity::find_by_id(account.id.into_inner())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let gl = gl_accounts::Entity::find_by_id(account.gl_account_id.into_inner())
        .one(db)
        .await
        .unwrap()
        .unwrap();
    (cash.balance, gl.balance)
}

#[tokio::test]
async fn test_halving_writes_marker_row_and_audit_trail() {
    let Some(db) = connect().await else { return };
    let account = create_account(&db, dec!(2000), dec!(2000)).await.unwrap();
    add_transaction(&db, account.id, Some("INV-7"), dec!(1000), dec!(1000), day(2025, 5, 2))
        .await
        .unwrap();

    let executor = CorrectionExecutor::new(db.clone());
    let correction = Correction::halve(account.id, &account.code, account.gl_account_id, dec!(2000));
    let applied = executor.apply(&[correction], &context()).await.unwrap();
    assert_eq!(applied, 1);

    assert_eq!(balances(&db, &account).await, (dec!(1000), dec!(1000)));

    let marker = cash_bank_transactions::Entity::find()
        .filter(cash_bank_transactions::Column::CashBankId.eq(account.id.into_inner()))
        .filter(cash_bank_transactions::Column::ReferenceType.eq(BALANCE_CORRECTION))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(marker.amount, Decimal::ZERO);
    assert_eq!(marker.balance_after, dec!(1000));

    let audit = cash_bank_audit_trail::Entity::find()
        .filter(cash_bank_audit_trail::Column::CashBankId.eq(account.id.into_inner()))
        .all(&db)
        .await
        .unwrap();
    assert!(audit.iter().any(|row| row.action == "DOUBLE_POSTING_FIX"));
}

#[tokio::test]
async fn test_one_stale_correction_rolls_back_whole_batch() {
    let Some(db) = connect().await else { return };
    let first = create_account(&db, dec!(100), dec!(0)).await.unwrap();
    let second = create_account(&db, dec!(200), dec!(0)).await.unwrap();
    let third = create_account(&db, dec!(300), dec!(0)).await.unwrap();

    let sync = |account: &common::TestAccount, target: Decimal| Correction::SyncGl {
        cash_bank_id: account.id,
        code: account.code.clone(),
        gl_account_id: account.gl_account_id,
        target_balance: target,
    };
    let batch = vec![
        sync(&first, dec!(100)),
        sync(&second, dec!(250)),
        sync(&third, dec!(300)),
    ];

    let executor = CorrectionExecutor::new(db.clone());
    let err = executor.apply(&batch, &context()).await.unwrap_err();
    assert!(matches!(
        err,
        CorrectionError::Fix(FixError::BatchFailed { failed: 1, total: 3, .. })
    ));

    assert_eq!(balances(&db, &first).await, (dec!(100), dec!(0)));
    assert_eq!(balances(&db, &third).await, (dec!(300), dec!(0)));

    let retry = vec![sync(&first, dec!(100)), sync(&second, dec!(200)), sync(&third, dec!(300))];
    assert_eq!(executor.apply(&retry, &context()).await.unwrap(), 3);
    assert_eq!(balances(&db, &second).await, (dec!(200), dec!(200)));
}

#[tokio::test]
async fn test_inspection_flags_duplicate_posting() {
    let Some(db) = connect().await else { return };
    let account = create_account(&db, dec!(1000), dec!(1000)).await.unwrap();
    let reference = format!("PAY-{}", account.code);
    add_transaction(&db, account.id, Some(&reference), dec!(500), dec!(500), day(2025, 6, 1))
        .await
        .unwrap();
    add_transaction(&db, account.id, Some(&reference), dec!(500), dec!(1000), day(2025, 6, 1))
        .await
        .unwrap();

    let sink = Arc::new(RecordingSink::default());
    let repo = MonitoringRepository::new(
        db.clone(),
        dec!(0.01),
        AlertPolicy::default(),
        Arc::clone(&sink) as Arc<dyn AlertSink>,
    );

    let inspection = repo
        .inspect_posting(&reference, account.id, dec!(500))
        .await
        .unwrap();
    assert_eq!(inspection.transactions_found, 2);
    assert!(inspection.multiple_transactions);
    assert!(inspection.amount_mismatch);
    assert_eq!(inspection.total_amount, dec!(1000));
    assert!(!inspection.double_posting_pattern);

    let alerts = sink.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].level, AlertLevel::High);
}
