//! Cash/bank audit trail repository.
//!
//! The audit trail is append-only; the table rejects updates and deletes.

use chrono::Utc;
use ledgerwatch_shared::error::AppError;
use ledgerwatch_shared::types::{
    AuditTrailId, CashBankAccountId, CashBankTransactionId, PageRequest, PageResponse, UserId,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::entities::{cash_bank_accounts, cash_bank_audit_trail};

/// Error types for audit trail operations.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// Cash/bank account not found.
    #[error("Cash/bank account not found: {0}")]
    AccountNotFound(CashBankAccountId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AuditError> for AppError {
    fn from(err: AuditError) -> Self {
        match &err {
            AuditError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            AuditError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Input for appending an audit record.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    /// Account the change concerns.
    pub cash_bank_id: CashBankAccountId,
    /// Ledger line involved, if any.
    pub transaction_id: Option<CashBankTransactionId>,
    /// What happened (e.g. `BALANCE_SYNC`, `DOUBLE_POSTING_FIX`).
    pub action: String,
    /// Kind of entity changed (e.g. `CASH_BANK`, `GL_ACCOUNT`).
    pub entity_type: String,
    /// Id of the entity changed.
    pub entity_id: Uuid,
    /// Field changed.
    pub field_changed: Option<String>,
    /// Value before.
    pub old_value: Option<String>,
    /// Value after.
    pub new_value: Option<String>,
    /// Why the change was made.
    pub reason: Option<String>,
    /// Acting user; `None` for the system.
    pub user_id: Option<UserId>,
}

/// Appends one audit record on any connection or transaction.
pub(crate) async fn insert_audit_entry<C: ConnectionTrait>(
    conn: &C,
    entry: NewAuditEntry,
) -> Result<cash_bank_audit_trail::Model, DbErr> {
    cash_bank_audit_trail::ActiveModel {
        id: Set(AuditTrailId::new().into_inner()),
        cash_bank_id: Set(entry.cash_bank_id.into_inner()),
        transaction_id: Set(entry.transaction_id.map(CashBankTransactionId::into_inner)),
        action: Set(entry.action),
        entity_type: Set(entry.entity_type),
        entity_id: Set(entry.entity_id),
        field_changed: Set(entry.field_changed),
        old_value: Set(entry.old_value),
        new_value: Set(entry.new_value),
        reason: Set(entry.reason),
        user_id: Set(entry.user_id.map(UserId::into_inner)),
        created_at: Set(Utc::now().into()),
    }
    .insert(conn)
    .await
}

/// Audit trail repository.
#[derive(Debug, Clone)]
pub struct AuditTrailRepository {
    db: DatabaseConnection,
}

impl AuditTrailRepository {
    /// Creates a new audit trail repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Appends an audit record.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or the insert fails.
    pub async fn log_audit_trail(
        &self,
        entry: NewAuditEntry,
    ) -> Result<cash_bank_audit_trail::Model, AuditError> {
        let exists = cash_bank_accounts::Entity::find_by_id(entry.cash_bank_id.into_inner())
            .one(&self.db)
            .await?
            .is_some();
        if !exists {
            return Err(AuditError::AccountNotFound(entry.cash_bank_id));
        }

        Ok(insert_audit_entry(&self.db, entry).await?)
    }

    /// Lists an account's audit records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn audit_trail(
        &self,
        cash_bank_id: CashBankAccountId,
        page: PageRequest,
    ) -> Result<PageResponse<cash_bank_audit_trail::Model>, AuditError> {
        let query = cash_bank_audit_trail::Entity::find()
            .filter(cash_bank_audit_trail::Column::CashBankId.eq(cash_bank_id.into_inner()));

        let total = query.clone().count(&self.db).await?;
        let records = query
            .order_by_desc(cash_bank_audit_trail::Column::CreatedAt)
            .order_by_desc(cash_bank_audit_trail::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(records, page, total))
    }
}
