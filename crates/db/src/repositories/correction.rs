//! The single write path for cached balances.
//!
//! Every correction runs inside one database transaction. Each correction
//! gets its own savepoint so a failure does not poison the remaining ones,
//! letting the executor report how many of the batch failed; any failure
//! rolls the whole batch back.

use chrono::Utc;
use ledgerwatch_core::monitoring::{Correction, FixError};
use ledgerwatch_shared::types::{CashBankAccountId, CashBankTransactionId, GlAccountId, UserId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QuerySelect, Set,
    TransactionTrait,
};
use tracing::{error, info, warn};

use super::audit::{NewAuditEntry, insert_audit_entry};
use crate::entities::{cash_bank_accounts, cash_bank_transactions, gl_accounts};

/// Reference type of the ledger line recorded by a double-posting fix.
pub const BALANCE_CORRECTION: &str = "BALANCE_CORRECTION";

/// Error types for corrective writes.
#[derive(Debug, thiserror::Error)]
pub enum CorrectionError {
    /// A correction was rejected or failed.
    #[error(transparent)]
    Fix(#[from] FixError),

    /// Cash/bank account vanished between planning and applying.
    #[error("Cash/bank account not found: {0}")]
    AccountNotFound(CashBankAccountId),

    /// GL account vanished between planning and applying.
    #[error("GL account not found: {0}")]
    GlAccountNotFound(GlAccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Who asked for the corrections and why.
#[derive(Debug, Clone)]
pub struct CorrectionContext {
    /// Acting user; `None` for the system.
    pub actor: Option<UserId>,
    /// Reason recorded in the audit trail.
    pub reason: String,
}

/// Applies planned corrections all-or-nothing.
#[derive(Debug, Clone)]
pub struct CorrectionExecutor {
    db: DatabaseConnection,
}

impl CorrectionExecutor {
    /// Creates a new executor.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Applies every correction or none of them.
    ///
    /// Returns the number of corrections applied.
    ///
    /// # Errors
    ///
    /// Returns [`FixError::BatchFailed`] (wrapped) when any correction fails;
    /// nothing is committed in that case.
    pub async fn apply(
        &self,
        corrections: &[Correction],
        context: &CorrectionContext,
    ) -> Result<usize, CorrectionError> {
        if corrections.is_empty() {
            return Ok(0);
        }

        let txn = self.db.begin().await?;
        let mut failed = 0;
        let mut first_error: Option<String> = None;

        for correction in corrections {
            let savepoint = txn.begin().await?;
            match apply_one(&savepoint, correction, context).await {
                Ok(()) => savepoint.commit().await?,
                Err(e) => {
                    warn!(
                        code = %correction.code(),
                        strategy = correction.strategy(),
                        error = %e,
                        "Correction failed"
                    );
                    savepoint.rollback().await?;
                    failed += 1;
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
        }

        if failed > 0 {
            txn.rollback().await?;
            error!(
                failed,
                total = corrections.len(),
                "Correction batch rolled back"
            );
            return Err(FixError::BatchFailed {
                failed,
                total: corrections.len(),
                first_error: first_error.unwrap_or_default(),
            }
            .into());
        }

        txn.commit().await?;
        info!(applied = corrections.len(), "Correction batch committed");
        Ok(corrections.len())
    }
}

async fn apply_one<C: ConnectionTrait>(
    conn: &C,
    correction: &Correction,
    context: &CorrectionContext,
) -> Result<(), CorrectionError> {
    match correction {
        Correction::SyncGl {
            cash_bank_id,
            code,
            gl_account_id,
            target_balance,
        } => {
            let account = lock_cash_bank(conn, *cash_bank_id).await?;
            ensure_unchanged(code, *target_balance, account.balance)?;
            mirror_gl(
                conn,
                *cash_bank_id,
                *gl_account_id,
                *target_balance,
                "BALANCE_SYNC",
                context,
            )
            .await
        }
        Correction::HalveDoublePosting {
            cash_bank_id,
            code,
            gl_account_id,
            observed_balance,
            corrected_balance,
        } => {
            let account = lock_cash_bank(conn, *cash_bank_id).await?;
            ensure_unchanged(code, *observed_balance, account.balance)?;

            let now = Utc::now();
            let removed = *observed_balance - *corrected_balance;
            let line_id = CashBankTransactionId::new();
            cash_bank_transactions::ActiveModel {
                id: Set(line_id.into_inner()),
                cash_bank_id: Set(cash_bank_id.into_inner()),
                reference_type: Set(BALANCE_CORRECTION.to_string()),
                reference_id: Set(None),
                amount: Set(Decimal::ZERO),
                balance_after: Set(*corrected_balance),
                transaction_date: Set(now.into()),
                notes: Set(Some(format!(
                    "Double posting correction: removed {removed} (balance {observed_balance} -> {corrected_balance})"
                ))),
                created_at: Set(now.into()),
            }
            .insert(conn)
            .await?;

            let mut active: cash_bank_accounts::ActiveModel = account.into();
            active.balance = Set(*corrected_balance);
            active.updated_at = Set(now.into());
            active.update(conn).await?;

            insert_audit_entry(
                conn,
                NewAuditEntry {
                    cash_bank_id: *cash_bank_id,
                    transaction_id: Some(line_id),
                    action: "DOUBLE_POSTING_FIX".to_string(),
                    entity_type: "CASH_BANK".to_string(),
                    entity_id: cash_bank_id.into_inner(),
                    field_changed: Some("balance".to_string()),
                    old_value: Some(observed_balance.to_string()),
                    new_value: Some(corrected_balance.to_string()),
                    reason: Some(context.reason.clone()),
                    user_id: context.actor,
                },
            )
            .await?;

            mirror_gl(
                conn,
                *cash_bank_id,
                *gl_account_id,
                *corrected_balance,
                "DOUBLE_POSTING_FIX",
                context,
            )
            .await
        }
    }
}

async fn lock_cash_bank<C: ConnectionTrait>(
    conn: &C,
    id: CashBankAccountId,
) -> Result<cash_bank_accounts::Model, CorrectionError> {
    cash_bank_accounts::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(CorrectionError::AccountNotFound(id))
}

fn ensure_unchanged(code: &str, expected: Decimal, found: Decimal) -> Result<(), CorrectionError> {
    if expected == found {
        Ok(())
    } else {
        Err(FixError::StaleBalance {
            code: code.to_string(),
            expected,
            found,
        }
        .into())
    }
}

async fn mirror_gl<C: ConnectionTrait>(
    conn: &C,
    cash_bank_id: CashBankAccountId,
    gl_account_id: GlAccountId,
    balance: Decimal,
    action: &str,
    context: &CorrectionContext,
) -> Result<(), CorrectionError> {
    let gl = gl_accounts::Entity::find_by_id(gl_account_id.into_inner())
        .lock_exclusive()
        .one(conn)
        .await?
        .ok_or(CorrectionError::GlAccountNotFound(gl_account_id))?;

    let previous = gl.balance;
    if previous == balance {
        return Ok(());
    }

    let mut active: gl_accounts::ActiveModel = gl.into();
    active.balance = Set(balance);
    active.updated_at = Set(Utc::now().into());
    active.update(conn).await?;

    insert_audit_entry(
        conn,
        NewAuditEntry {
            cash_bank_id,
            transaction_id: None,
            action: action.to_string(),
            entity_type: "GL_ACCOUNT".to_string(),
            entity_id: gl_account_id.into_inner(),
            field_changed: Some("balance".to_string()),
            old_value: Some(previous.to_string()),
            new_value: Some(balance.to_string()),
            reason: Some(context.reason.clone()),
            user_id: context.actor,
        },
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_stale_balance_is_rejected() {
        let err = ensure_unchanged("CB-001", dec!(200), dec!(250)).unwrap_err();
        assert!(matches!(
            err,
            CorrectionError::Fix(FixError::StaleBalance { found, .. }) if found == dec!(250)
        ));
        assert!(ensure_unchanged("CB-001", dec!(200.00), dec!(200)).is_ok());
    }
}
