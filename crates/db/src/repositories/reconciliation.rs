//! Reconciliation repository.
//!
//! Persists hash-sealed snapshots of a cash/bank account's ledger for a
//! period, compares two snapshots and manages the review of the resulting
//! reconciliation.

use chrono::{DateTime, Utc};
use ledgerwatch_core::integrity::Severity;
use ledgerwatch_core::reconciliation::{
    Difference, DifferenceType as DomainDifferenceType, FrozenTransaction, LedgerTransaction,
    Period, ReconciliationError, ReconciliationStatus as DomainReconciliationStatus,
    ReconciliationSummary, ReconciliationWorkflow, SnapshotContent, compare,
    reconciliation_number,
};
use ledgerwatch_shared::error::AppError;
use ledgerwatch_shared::types::{
    CashBankAccountId, CashBankTransactionId, PageRequest, PageResponse, ReconciliationId,
    SnapshotId, UserId,
};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::entities::{
    bank_reconciliations, cash_bank_accounts, cash_bank_transactions, reconciliation_differences,
    reconciliation_snapshots, reconciliation_transaction_snapshots,
    sea_orm_active_enums::{DifferenceType, ReconciliationStatus, SeverityLevel, SnapshotStatus},
};

/// Notes attached to a comparison snapshot generated on demand.
pub const AUTO_GENERATED_NOTE: &str = "Auto-generated for reconciliation";

/// Error types for reconciliation operations.
#[derive(Debug, thiserror::Error)]
pub enum ReconciliationRepoError {
    /// Domain rule violated.
    #[error(transparent)]
    Domain(#[from] ReconciliationError),

    /// Cash/bank account not found.
    #[error("Cash/bank account not found: {0}")]
    AccountNotFound(CashBankAccountId),

    /// Snapshot not found.
    #[error("Snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    /// Reconciliation not found.
    #[error("Reconciliation not found: {0}")]
    ReconciliationNotFound(ReconciliationId),

    /// Snapshot is already locked.
    #[error("Snapshot {0} is already locked")]
    AlreadyLocked(SnapshotId),

    /// Locked snapshots cannot be deleted.
    #[error("Snapshot {0} is locked and cannot be deleted")]
    SnapshotLocked(SnapshotId),

    /// Snapshot is referenced by a reconciliation.
    #[error("Snapshot {0} is used by a reconciliation and cannot be deleted")]
    SnapshotInUse(SnapshotId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl ReconciliationRepoError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Domain(e) => e.error_code(),
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::SnapshotNotFound(_) => "SNAPSHOT_NOT_FOUND",
            Self::ReconciliationNotFound(_) => "RECONCILIATION_NOT_FOUND",
            Self::AlreadyLocked(_) => "SNAPSHOT_ALREADY_LOCKED",
            Self::SnapshotLocked(_) => "SNAPSHOT_LOCKED",
            Self::SnapshotInUse(_) => "SNAPSHOT_IN_USE",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Domain(e) => e.http_status_code(),
            Self::AccountNotFound(_)
            | Self::SnapshotNotFound(_)
            | Self::ReconciliationNotFound(_) => 404,
            Self::AlreadyLocked(_) | Self::SnapshotLocked(_) | Self::SnapshotInUse(_) => 409,
            Self::Database(_) => 500,
        }
    }
}

impl From<ReconciliationRepoError> for AppError {
    fn from(err: ReconciliationRepoError) -> Self {
        match err.http_status_code() {
            400 => Self::Validation(err.to_string()),
            404 => Self::NotFound(err.to_string()),
            409 => Self::Conflict(err.to_string()),
            _ => match err {
                ReconciliationRepoError::Database(e) => Self::Database(e.to_string()),
                other => Self::Internal(other.to_string()),
            },
        }
    }
}

/// Input for generating a snapshot.
#[derive(Debug, Clone)]
pub struct GenerateSnapshotInput {
    /// Account to snapshot.
    pub cash_bank_id: CashBankAccountId,
    /// Calendar month covered.
    pub period: Period,
    /// Free-text notes.
    pub notes: Option<String>,
    /// User generating the snapshot.
    pub generated_by: UserId,
}

/// Input for reconciling a base snapshot against a comparison.
#[derive(Debug, Clone)]
pub struct PerformReconciliationInput {
    /// Account being reconciled.
    pub cash_bank_id: CashBankAccountId,
    /// The earlier, trusted snapshot.
    pub base_snapshot_id: SnapshotId,
    /// Snapshot to compare against; generated from the current ledger when `None`.
    pub comparison_snapshot_id: Option<SnapshotId>,
    /// User performing the reconciliation.
    pub reconciliation_by: UserId,
    /// Free-text notes.
    pub notes: Option<String>,
}

/// A snapshot header with its frozen rows in `(date, id)` order.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotWithTransactions {
    /// Snapshot header.
    pub snapshot: reconciliation_snapshots::Model,
    /// Frozen transactions.
    pub transactions: Vec<reconciliation_transaction_snapshots::Model>,
}

/// Result of re-hashing a stored snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotVerification {
    /// Snapshot checked.
    pub snapshot_id: SnapshotId,
    /// Hash sealed at generation.
    pub stored_hash: String,
    /// Hash of the stored header and rows now.
    pub computed_hash: String,
    /// True when both hashes match.
    pub is_valid: bool,
}

/// A reconciliation header with its differences in detection order.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciliationWithDifferences {
    /// Reconciliation header.
    pub reconciliation: bank_reconciliations::Model,
    /// Differences found.
    pub differences: Vec<reconciliation_differences::Model>,
}

/// Reconciliation repository.
#[derive(Debug, Clone)]
pub struct ReconciliationRepository {
    db: DatabaseConnection,
}

impl ReconciliationRepository {
    /// Creates a new reconciliation repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Freezes the account's transactions for a period and seals them with a hash.
    ///
    /// The header and all frozen rows are written in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or a database
    /// operation fails.
    #[instrument(skip(self, input), fields(cash_bank_id = %input.cash_bank_id, period = %input.period))]
    pub async fn generate_snapshot(
        &self,
        input: GenerateSnapshotInput,
    ) -> Result<SnapshotWithTransactions, ReconciliationRepoError> {
        let txn = self.db.begin().await?;
        let generated = freeze_snapshot(&txn, input).await?;
        txn.commit().await?;

        info!(
            snapshot_id = %generated.snapshot.id,
            transaction_count = generated.snapshot.transaction_count,
            opening_balance = %generated.snapshot.opening_balance,
            closing_balance = %generated.snapshot.closing_balance,
            "Reconciliation snapshot generated"
        );
        Ok(generated)
    }

    /// Lists an account's snapshots, newest first, optionally for one period.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_snapshots(
        &self,
        cash_bank_id: CashBankAccountId,
        period: Option<Period>,
    ) -> Result<Vec<reconciliation_snapshots::Model>, ReconciliationRepoError> {
        let mut query = reconciliation_snapshots::Entity::find()
            .filter(reconciliation_snapshots::Column::CashBankId.eq(cash_bank_id.into_inner()));
        if let Some(period) = period {
            query = query.filter(reconciliation_snapshots::Column::Period.eq(period.to_string()));
        }

        Ok(query
            .order_by_desc(reconciliation_snapshots::Column::CreatedAt)
            .order_by_desc(reconciliation_snapshots::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Gets a snapshot with its frozen rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot does not exist or the query fails.
    pub async fn get_snapshot(
        &self,
        snapshot_id: SnapshotId,
    ) -> Result<SnapshotWithTransactions, ReconciliationRepoError> {
        load_snapshot(&self.db, snapshot_id).await
    }

    /// Re-hashes a stored snapshot and compares with the sealed hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot does not exist or cannot be read.
    pub async fn verify_snapshot(
        &self,
        snapshot_id: SnapshotId,
    ) -> Result<SnapshotVerification, ReconciliationRepoError> {
        let stored = self.get_snapshot(snapshot_id).await?;
        let computed_hash = stored_content(&stored)?.content_hash()?;
        let is_valid = computed_hash == stored.snapshot.data_hash;

        if !is_valid {
            warn!(
                snapshot_id = %snapshot_id,
                stored_hash = %stored.snapshot.data_hash,
                computed_hash = %computed_hash,
                "Snapshot hash mismatch"
            );
        }

        Ok(SnapshotVerification {
            snapshot_id,
            stored_hash: stored.snapshot.data_hash,
            computed_hash,
            is_valid,
        })
    }

    /// Seals a snapshot. The only mutation a snapshot ever receives.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot does not exist or is already locked.
    #[instrument(skip(self))]
    pub async fn lock_snapshot(
        &self,
        snapshot_id: SnapshotId,
        locked_by: UserId,
    ) -> Result<reconciliation_snapshots::Model, ReconciliationRepoError> {
        let txn = self.db.begin().await?;
        let snapshot = reconciliation_snapshots::Entity::find_by_id(snapshot_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ReconciliationRepoError::SnapshotNotFound(snapshot_id))?;

        if snapshot.is_locked {
            return Err(ReconciliationRepoError::AlreadyLocked(snapshot_id));
        }

        let now = Utc::now();
        let mut active: reconciliation_snapshots::ActiveModel = snapshot.into();
        active.is_locked = Set(true);
        active.locked_at = Set(Some(now.into()));
        active.locked_by = Set(Some(locked_by.into_inner()));
        active.status = Set(SnapshotStatus::Locked);
        active.updated_at = Set(now.into());
        let locked = active.update(&txn).await?;
        txn.commit().await?;

        info!(snapshot_id = %snapshot_id, locked_by = %locked_by, "Snapshot locked");
        Ok(locked)
    }

    /// Deletes an unlocked snapshot no reconciliation refers to.
    ///
    /// Frozen rows are removed by cascade.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot is missing, locked or in use.
    pub async fn delete_snapshot(&self, snapshot_id: SnapshotId) -> Result<(), ReconciliationRepoError> {
        let txn = self.db.begin().await?;
        let snapshot = reconciliation_snapshots::Entity::find_by_id(snapshot_id.into_inner())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(ReconciliationRepoError::SnapshotNotFound(snapshot_id))?;

        if snapshot.is_locked {
            return Err(ReconciliationRepoError::SnapshotLocked(snapshot_id));
        }

        let references = bank_reconciliations::Entity::find()
            .filter(
                Condition::any()
                    .add(bank_reconciliations::Column::BaseSnapshotId.eq(snapshot_id.into_inner()))
                    .add(
                        bank_reconciliations::Column::ComparisonSnapshotId
                            .eq(snapshot_id.into_inner()),
                    ),
            )
            .count(&txn)
            .await?;
        if references > 0 {
            return Err(ReconciliationRepoError::SnapshotInUse(snapshot_id));
        }

        snapshot.delete(&txn).await?;
        txn.commit().await?;

        info!(snapshot_id = %snapshot_id, "Snapshot deleted");
        Ok(())
    }

    // ========================================================================
    // Reconciliations
    // ========================================================================

    /// Compares a base snapshot with a comparison snapshot and stores a
    /// PENDING reconciliation with its differences.
    ///
    /// Without a comparison snapshot one is generated from the current
    /// ledger for the base snapshot's period, in the same transaction as the
    /// reconciliation: a failed comparison leaves no snapshot behind.
    ///
    /// # Errors
    ///
    /// Returns an error if a snapshot is missing or belongs to another
    /// account, or a database operation fails.
    #[instrument(skip(self, input), fields(cash_bank_id = %input.cash_bank_id, base_snapshot_id = %input.base_snapshot_id))]
    pub async fn perform_reconciliation(
        &self,
        input: PerformReconciliationInput,
    ) -> Result<ReconciliationWithDifferences, ReconciliationRepoError> {
        let txn = self.db.begin().await?;
        let base = load_snapshot(&txn, input.base_snapshot_id).await?;
        if base.snapshot.cash_bank_id != input.cash_bank_id.into_inner() {
            return Err(ReconciliationError::AccountMismatch.into());
        }
        let period = Period::parse(&base.snapshot.period)?;

        let comparison = match input.comparison_snapshot_id {
            Some(id) => load_snapshot(&txn, id).await?,
            None => {
                freeze_snapshot(
                    &txn,
                    GenerateSnapshotInput {
                        cash_bank_id: input.cash_bank_id,
                        period,
                        notes: Some(AUTO_GENERATED_NOTE.to_string()),
                        generated_by: input.reconciliation_by,
                    },
                )
                .await?
            }
        };
        if comparison.snapshot.cash_bank_id != base.snapshot.cash_bank_id {
            return Err(ReconciliationError::AccountMismatch.into());
        }

        let base_content = stored_content(&base)?;
        let comparison_content = stored_content(&comparison)?;
        let differences = compare(&base_content.transactions, &comparison_content.transactions);
        let summary =
            ReconciliationSummary::from_snapshots(&base_content, &comparison_content, &differences);

        let now = Utc::now();
        let reconciliation_id = ReconciliationId::new();

        let reconciliation = bank_reconciliations::ActiveModel {
            id: Set(reconciliation_id.into_inner()),
            reconciliation_number: Set(reconciliation_number(
                period,
                reconciliation_id.into_inner(),
            )),
            cash_bank_id: Set(input.cash_bank_id.into_inner()),
            period: Set(period.to_string()),
            base_snapshot_id: Set(base.snapshot.id),
            comparison_snapshot_id: Set(comparison.snapshot.id),
            reconciliation_date: Set(now.into()),
            reconciliation_by: Set(input.reconciliation_by.into_inner()),
            base_balance: Set(summary.base_balance),
            current_balance: Set(summary.current_balance),
            variance: Set(summary.variance),
            base_transaction_count: Set(to_i32(summary.base_transaction_count)),
            current_transaction_count: Set(to_i32(summary.current_transaction_count)),
            transaction_variance: Set(to_i32(summary.transaction_variance)),
            missing_transactions: Set(to_i32(summary.missing_transactions)),
            added_transactions: Set(to_i32(summary.added_transactions)),
            modified_transactions: Set(to_i32(summary.modified_transactions)),
            status: Set(ReconciliationStatus::Pending),
            reviewed_by: Set(None),
            reviewed_at: Set(None),
            review_notes: Set(None),
            is_balanced: Set(summary.is_balanced),
            balance_confirmed: Set(false),
            notes: Set(input.notes),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        let rows: Vec<reconciliation_differences::ActiveModel> = differences
            .iter()
            .enumerate()
            .map(|(position, difference)| difference_row(reconciliation_id, position, difference, now))
            .collect();
        if !rows.is_empty() {
            reconciliation_differences::Entity::insert_many(rows)
                .exec(&txn)
                .await?;
        }

        let stored_differences = difference_rows(&txn, reconciliation_id).await?;
        txn.commit().await?;

        if summary.is_balanced {
            info!(
                reconciliation_number = %reconciliation.reconciliation_number,
                "Reconciliation balanced"
            );
        } else {
            warn!(
                reconciliation_number = %reconciliation.reconciliation_number,
                variance = %summary.variance,
                transaction_variance = summary.transaction_variance,
                missing = summary.missing_transactions,
                added = summary.added_transactions,
                modified = summary.modified_transactions,
                "Reconciliation found differences"
            );
        }

        Ok(ReconciliationWithDifferences {
            reconciliation,
            differences: stored_differences,
        })
    }

    /// Lists an account's reconciliations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_reconciliations(
        &self,
        cash_bank_id: CashBankAccountId,
        page: PageRequest,
    ) -> Result<PageResponse<bank_reconciliations::Model>, ReconciliationRepoError> {
        let query = bank_reconciliations::Entity::find()
            .filter(bank_reconciliations::Column::CashBankId.eq(cash_bank_id.into_inner()));

        let total = query.clone().count(&self.db).await?;
        let records = query
            .order_by_desc(bank_reconciliations::Column::CreatedAt)
            .order_by_desc(bank_reconciliations::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(records, page, total))
    }

    /// Gets a reconciliation with its differences.
    ///
    /// # Errors
    ///
    /// Returns an error if the reconciliation does not exist or the query fails.
    pub async fn get_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
    ) -> Result<ReconciliationWithDifferences, ReconciliationRepoError> {
        let reconciliation =
            bank_reconciliations::Entity::find_by_id(reconciliation_id.into_inner())
                .one(&self.db)
                .await?
                .ok_or(ReconciliationRepoError::ReconciliationNotFound(
                    reconciliation_id,
                ))?;
        let differences = difference_rows(&self.db, reconciliation_id).await?;

        Ok(ReconciliationWithDifferences {
            reconciliation,
            differences,
        })
    }

    /// PENDING → APPROVED, stamping the reviewer.
    ///
    /// # Errors
    ///
    /// Returns an error if the reconciliation is missing or not pending.
    #[instrument(skip(self, notes))]
    pub async fn approve_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
        reviewer: UserId,
        notes: Option<String>,
    ) -> Result<bank_reconciliations::Model, ReconciliationRepoError> {
        self.review(reconciliation_id, reviewer, |current| {
            ReconciliationWorkflow::approve(current).map(|status| (status, notes))
        })
        .await
    }

    /// PENDING → REJECTED with a mandatory reason.
    ///
    /// # Errors
    ///
    /// Returns an error if the reason is blank or the reconciliation is
    /// missing or not pending.
    #[instrument(skip(self, reason))]
    pub async fn reject_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
        reviewer: UserId,
        reason: &str,
    ) -> Result<bank_reconciliations::Model, ReconciliationRepoError> {
        self.review(reconciliation_id, reviewer, |current| {
            ReconciliationWorkflow::reject(current, reason)
                .map(|status| (status, Some(reason.trim().to_string())))
        })
        .await
    }

    async fn review(
        &self,
        reconciliation_id: ReconciliationId,
        reviewer: UserId,
        transition: impl FnOnce(
            DomainReconciliationStatus,
        ) -> Result<(DomainReconciliationStatus, Option<String>), ReconciliationError>,
    ) -> Result<bank_reconciliations::Model, ReconciliationRepoError> {
        let txn = self.db.begin().await?;
        let reconciliation =
            bank_reconciliations::Entity::find_by_id(reconciliation_id.into_inner())
                .lock_exclusive()
                .one(&txn)
                .await?
                .ok_or(ReconciliationRepoError::ReconciliationNotFound(
                    reconciliation_id,
                ))?;

        let (status, review_notes) = transition(to_domain_status(reconciliation.status))?;
        let approved = status == DomainReconciliationStatus::Approved;

        let now = Utc::now();
        let mut active: bank_reconciliations::ActiveModel = reconciliation.into();
        active.status = Set(to_db_status(status));
        active.reviewed_by = Set(Some(reviewer.into_inner()));
        active.reviewed_at = Set(Some(now.into()));
        active.review_notes = Set(review_notes);
        active.balance_confirmed = Set(approved);
        active.updated_at = Set(now.into());
        let reviewed = active.update(&txn).await?;
        txn.commit().await?;

        info!(
            reconciliation_id = %reconciliation_id,
            reviewer = %reviewer,
            status = %status,
            "Reconciliation reviewed"
        );
        Ok(reviewed)
    }
}

// ============================================================================
// Snapshot persistence
// ============================================================================

/// Freezes a snapshot on `conn`; the caller owns the transaction.
async fn freeze_snapshot<C: ConnectionTrait>(
    conn: &C,
    input: GenerateSnapshotInput,
) -> Result<SnapshotWithTransactions, ReconciliationRepoError> {
    let (start, end) = input.period.window()?;

    cash_bank_accounts::Entity::find_by_id(input.cash_bank_id.into_inner())
        .one(conn)
        .await?
        .ok_or(ReconciliationRepoError::AccountNotFound(input.cash_bank_id))?;

    let opening_balance = cash_bank_transactions::Entity::find()
        .filter(cash_bank_transactions::Column::CashBankId.eq(input.cash_bank_id.into_inner()))
        .filter(cash_bank_transactions::Column::TransactionDate.lt(start))
        .order_by_desc(cash_bank_transactions::Column::TransactionDate)
        .order_by_desc(cash_bank_transactions::Column::Id)
        .one(conn)
        .await?
        .map_or(Decimal::ZERO, |last| last.balance_after);

    let ledger: Vec<LedgerTransaction> = cash_bank_transactions::Entity::find()
        .filter(cash_bank_transactions::Column::CashBankId.eq(input.cash_bank_id.into_inner()))
        .filter(cash_bank_transactions::Column::TransactionDate.gte(start))
        .filter(cash_bank_transactions::Column::TransactionDate.lt(end))
        .order_by_asc(cash_bank_transactions::Column::TransactionDate)
        .order_by_asc(cash_bank_transactions::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .map(to_ledger_transaction)
        .collect();

    let content =
        SnapshotContent::build(input.cash_bank_id, input.period, opening_balance, &ledger);
    let data_hash = content.content_hash()?;

    let now = Utc::now();
    let snapshot_id = SnapshotId::new();
    let snapshot = reconciliation_snapshots::ActiveModel {
        id: Set(snapshot_id.into_inner()),
        cash_bank_id: Set(input.cash_bank_id.into_inner()),
        period: Set(input.period.to_string()),
        snapshot_date: Set(now.into()),
        generated_by: Set(input.generated_by.into_inner()),
        opening_balance: Set(content.opening_balance),
        closing_balance: Set(content.closing_balance),
        total_debit: Set(content.total_debit),
        total_credit: Set(content.total_credit),
        transaction_count: Set(to_i32(content.transaction_count)),
        data_hash: Set(data_hash),
        is_locked: Set(false),
        locked_at: Set(None),
        locked_by: Set(None),
        status: Set(SnapshotStatus::Active),
        notes: Set(input.notes),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(conn)
    .await?;

    let rows: Vec<reconciliation_transaction_snapshots::ActiveModel> = content
        .transactions
        .iter()
        .enumerate()
        .map(|(position, tx)| frozen_row(snapshot_id, position, tx, now))
        .collect();
    if !rows.is_empty() {
        reconciliation_transaction_snapshots::Entity::insert_many(rows)
            .exec(conn)
            .await?;
    }

    let transactions = frozen_rows(conn, snapshot_id).await?;
    Ok(SnapshotWithTransactions {
        snapshot,
        transactions,
    })
}

async fn load_snapshot<C: ConnectionTrait>(
    conn: &C,
    snapshot_id: SnapshotId,
) -> Result<SnapshotWithTransactions, ReconciliationRepoError> {
    let snapshot = reconciliation_snapshots::Entity::find_by_id(snapshot_id.into_inner())
        .one(conn)
        .await?
        .ok_or(ReconciliationRepoError::SnapshotNotFound(snapshot_id))?;
    let transactions = frozen_rows(conn, snapshot_id).await?;

    Ok(SnapshotWithTransactions {
        snapshot,
        transactions,
    })
}

// ============================================================================
// Row mapping
// ============================================================================

async fn frozen_rows<C: ConnectionTrait>(
    conn: &C,
    snapshot_id: SnapshotId,
) -> Result<Vec<reconciliation_transaction_snapshots::Model>, DbErr> {
    reconciliation_transaction_snapshots::Entity::find()
        .filter(
            reconciliation_transaction_snapshots::Column::SnapshotId.eq(snapshot_id.into_inner()),
        )
        .order_by_asc(reconciliation_transaction_snapshots::Column::Position)
        .all(conn)
        .await
}

async fn difference_rows<C: ConnectionTrait>(
    conn: &C,
    reconciliation_id: ReconciliationId,
) -> Result<Vec<reconciliation_differences::Model>, DbErr> {
    reconciliation_differences::Entity::find()
        .filter(
            reconciliation_differences::Column::ReconciliationId
                .eq(reconciliation_id.into_inner()),
        )
        .order_by_asc(reconciliation_differences::Column::Position)
        .all(conn)
        .await
}

fn to_ledger_transaction(model: cash_bank_transactions::Model) -> LedgerTransaction {
    LedgerTransaction {
        id: CashBankTransactionId::from_uuid(model.id),
        transaction_date: model.transaction_date.with_timezone(&Utc),
        reference_type: model.reference_type,
        reference_id: model.reference_id,
        amount: model.amount,
        balance_after: model.balance_after,
        notes: model.notes,
    }
}

/// Rebuilds hashable content from a stored header and its frozen rows.
///
/// Aggregates come from the header, not from the rows, so tampering with
/// either changes the hash.
fn stored_content(stored: &SnapshotWithTransactions) -> Result<SnapshotContent, ReconciliationError> {
    let header = &stored.snapshot;
    Ok(SnapshotContent {
        account_id: CashBankAccountId::from_uuid(header.cash_bank_id),
        period: Period::parse(&header.period)?,
        opening_balance: header.opening_balance,
        closing_balance: header.closing_balance,
        total_debit: header.total_debit,
        total_credit: header.total_credit,
        transaction_count: usize::try_from(header.transaction_count).unwrap_or_default(),
        transactions: stored
            .transactions
            .iter()
            .map(|row| FrozenTransaction {
                transaction_id: CashBankTransactionId::from_uuid(row.transaction_id),
                transaction_date: row.transaction_date.with_timezone(&Utc),
                reference_type: row.reference_type.clone(),
                reference_id: row.reference_id.clone(),
                amount: row.amount,
                debit_amount: row.debit_amount,
                credit_amount: row.credit_amount,
                balance_after: row.balance_after,
                notes: row.notes.clone(),
            })
            .collect(),
    })
}

fn frozen_row(
    snapshot_id: SnapshotId,
    position: usize,
    tx: &FrozenTransaction,
    created_at: DateTime<Utc>,
) -> reconciliation_transaction_snapshots::ActiveModel {
    reconciliation_transaction_snapshots::ActiveModel {
        id: Set(uuid::Uuid::now_v7()),
        snapshot_id: Set(snapshot_id.into_inner()),
        position: Set(to_i32(position)),
        transaction_id: Set(tx.transaction_id.into_inner()),
        transaction_date: Set(tx.transaction_date.into()),
        reference_type: Set(tx.reference_type.clone()),
        reference_id: Set(tx.reference_id.clone()),
        amount: Set(tx.amount),
        debit_amount: Set(tx.debit_amount),
        credit_amount: Set(tx.credit_amount),
        balance_after: Set(tx.balance_after),
        notes: Set(tx.notes.clone()),
        created_at: Set(created_at.into()),
    }
}

fn difference_row(
    reconciliation_id: ReconciliationId,
    position: usize,
    difference: &Difference,
    created_at: DateTime<Utc>,
) -> reconciliation_differences::ActiveModel {
    reconciliation_differences::ActiveModel {
        id: Set(uuid::Uuid::now_v7()),
        reconciliation_id: Set(reconciliation_id.into_inner()),
        position: Set(to_i32(position)),
        difference_type: Set(to_db_difference_type(difference.difference_type)),
        severity: Set(to_severity_level(difference.severity)),
        base_transaction_id: Set(difference
            .base_transaction_id
            .map(CashBankTransactionId::into_inner)),
        current_transaction_id: Set(difference
            .current_transaction_id
            .map(CashBankTransactionId::into_inner)),
        field: Set(difference.field.clone()),
        old_value: Set(difference.old_value.clone()),
        new_value: Set(difference.new_value.clone()),
        amount_difference: Set(difference.amount_difference),
        description: Set(difference.description.clone()),
        created_at: Set(created_at.into()),
    }
}

fn to_i32<T: TryInto<i32>>(value: T) -> i32 {
    value.try_into().unwrap_or(i32::MAX)
}

const fn to_db_difference_type(value: DomainDifferenceType) -> DifferenceType {
    match value {
        DomainDifferenceType::Missing => DifferenceType::Missing,
        DomainDifferenceType::Added => DifferenceType::Added,
        DomainDifferenceType::AmountChange => DifferenceType::AmountChange,
        DomainDifferenceType::DateChange => DifferenceType::DateChange,
    }
}

const fn to_severity_level(value: Severity) -> SeverityLevel {
    match value {
        Severity::Low => SeverityLevel::Low,
        Severity::Medium => SeverityLevel::Medium,
        Severity::High => SeverityLevel::High,
        Severity::Critical => SeverityLevel::Critical,
    }
}

const fn to_domain_status(value: ReconciliationStatus) -> DomainReconciliationStatus {
    match value {
        ReconciliationStatus::Pending => DomainReconciliationStatus::Pending,
        ReconciliationStatus::Approved => DomainReconciliationStatus::Approved,
        ReconciliationStatus::Rejected => DomainReconciliationStatus::Rejected,
    }
}

const fn to_db_status(value: DomainReconciliationStatus) -> ReconciliationStatus {
    match value {
        DomainReconciliationStatus::Pending => ReconciliationStatus::Pending,
        DomainReconciliationStatus::Approved => ReconciliationStatus::Approved,
        DomainReconciliationStatus::Rejected => ReconciliationStatus::Rejected,
    }
}
