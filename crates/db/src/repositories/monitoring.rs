//! Monitoring repository.
//!
//! The database-backed [`MonitorProbe`] the scheduler drives, plus the
//! on-demand balance health summary and posting inspection.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use ledgerwatch_core::integrity::check_double_posting;
use ledgerwatch_core::monitoring::{
    AlertPolicy, AlertSink, BalanceHealth, DoublePostingReport, FixPlan, FixSummary,
    MonitorProbe, PostingInspection, PostingObservation, ProbeError, SyncReport,
    corrections_from_sync,
};
use ledgerwatch_shared::error::AppError;
use ledgerwatch_shared::types::CashBankAccountId;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbBackend, DbErr, EntityTrait, FromQueryResult, QueryFilter,
    QueryOrder, Statement,
};
use tracing::{info, instrument, warn};

use super::correction::{CorrectionContext, CorrectionError, CorrectionExecutor};
use super::ledger_rows;
use crate::entities::{cash_bank_accounts, cash_bank_transactions};

const ACCOUNT_TRANSACTION_SUM_SQL: &str = r"
SELECT COALESCE(SUM(amount), 0) AS transaction_sum
FROM cash_bank_transactions
WHERE cash_bank_id = $1
";

#[derive(Debug, FromQueryResult)]
struct TransactionSumRow {
    transaction_sum: Decimal,
}

/// Error types for monitoring operations.
#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    /// Cash/bank account not found.
    #[error("Cash/bank account not found: {0}")]
    AccountNotFound(CashBankAccountId),

    /// GL sync corrections failed.
    #[error(transparent)]
    Correction(#[from] CorrectionError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<MonitoringError> for AppError {
    fn from(err: MonitoringError) -> Self {
        match &err {
            MonitoringError::AccountNotFound(_) => Self::NotFound(err.to_string()),
            MonitoringError::Correction(_) => Self::BusinessRule(err.to_string()),
            MonitoringError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Monitoring repository.
#[derive(Clone)]
pub struct MonitoringRepository {
    db: DatabaseConnection,
    tolerance: Decimal,
    policy: AlertPolicy,
    sink: Arc<dyn AlertSink>,
    executor: CorrectionExecutor,
}

impl MonitoringRepository {
    /// Creates a new monitoring repository.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        tolerance: Decimal,
        policy: AlertPolicy,
        sink: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            executor: CorrectionExecutor::new(db.clone()),
            db,
            tolerance,
            policy,
            sink,
        }
    }

    /// Compares every active cash/bank account with its GL mirror.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn balance_sync(&self) -> Result<SyncReport, MonitoringError> {
        let rows = ledger_rows::cash_bank_gl(&self.db).await?;
        let report = SyncReport::from_rows(&rows, Utc::now());

        info!(
            total_accounts = report.total_accounts,
            unsynchronized = report.unsynchronized_accounts,
            status = %report.status,
            "Balance sync checked"
        );
        Ok(report)
    }

    /// Double-posting detector over every active cash/bank account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn double_posting(&self) -> Result<DoublePostingReport, MonitoringError> {
        let rows = ledger_rows::cash_bank_sums(&self.db).await?;
        let report =
            DoublePostingReport::from_outcome(check_double_posting(&rows, self.tolerance), Utc::now());

        info!(
            accounts_checked = report.total_accounts_checked,
            patterns_found = report.patterns_found,
            status = %report.status,
            "Double posting checked"
        );
        Ok(report)
    }

    /// Sync status summary with percentages and drift totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn balance_health(&self) -> Result<BalanceHealth, MonitoringError> {
        let report = self.balance_sync().await?;
        Ok(BalanceHealth::from(&report))
    }

    /// Syncs every drifted GL mirror to its cash/bank balance, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if any correction fails; nothing is committed then.
    pub async fn sync_gl(&self, report: &SyncReport) -> Result<FixSummary, MonitoringError> {
        let plan = FixPlan {
            corrections: corrections_from_sync(report),
            manual_review: Vec::new(),
        };
        if plan.corrections.is_empty() {
            return Ok(FixSummary::applied(plan));
        }

        let context = CorrectionContext {
            actor: None,
            reason: "Automatic GL synchronization by balance monitor".to_string(),
        };
        self.executor.apply(&plan.corrections, &context).await?;

        info!(
            corrections = plan.corrections.len(),
            "GL mirrors synchronized"
        );
        Ok(FixSummary::applied(plan))
    }

    /// Inspects one posting: how many lines carry `reference_id`, whether
    /// their sum on `cash_bank_id` matches `expected_amount`, and whether
    /// the account now shows the double-posting signature.
    ///
    /// Suspicious findings are raised through the alert sink.
    ///
    /// # Errors
    ///
    /// Returns an error if the account does not exist or a query fails.
    #[instrument(skip(self))]
    pub async fn inspect_posting(
        &self,
        reference_id: &str,
        cash_bank_id: CashBankAccountId,
        expected_amount: Decimal,
    ) -> Result<PostingInspection, MonitoringError> {
        let account = cash_bank_accounts::Entity::find_by_id(cash_bank_id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(MonitoringError::AccountNotFound(cash_bank_id))?;

        let lines = cash_bank_transactions::Entity::find()
            .filter(cash_bank_transactions::Column::ReferenceId.eq(reference_id))
            .order_by_asc(cash_bank_transactions::Column::CreatedAt)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|line| (CashBankAccountId::from_uuid(line.cash_bank_id), line.amount))
            .collect();

        let account_transaction_sum = TransactionSumRow::find_by_statement(
            Statement::from_sql_and_values(
                DbBackend::Postgres,
                ACCOUNT_TRANSACTION_SUM_SQL,
                [cash_bank_id.into_inner().into()],
            ),
        )
        .one(&self.db)
        .await?
        .map_or(Decimal::ZERO, |row| row.transaction_sum);

        let observation = PostingObservation {
            lines,
            account_balance: account.balance,
            account_transaction_sum,
        };
        let inspection = PostingInspection::evaluate(
            reference_id,
            cash_bank_id,
            expected_amount,
            &observation,
            self.tolerance,
            Utc::now(),
        );

        if let Some(alert) = self.policy.inspection_alert(&inspection) {
            warn!(
                reference_id,
                code = %account.code,
                transactions_found = inspection.transactions_found,
                "Suspicious posting"
            );
            self.sink.emit(&alert);
        }

        Ok(inspection)
    }
}

#[async_trait]
impl MonitorProbe for MonitoringRepository {
    async fn check_balance_sync(&self) -> Result<SyncReport, ProbeError> {
        Ok(self.balance_sync().await?)
    }

    async fn detect_double_posting(&self) -> Result<DoublePostingReport, ProbeError> {
        Ok(self.double_posting().await?)
    }

    async fn apply_gl_sync(&self, report: &SyncReport) -> Result<FixSummary, ProbeError> {
        Ok(self.sync_gl(report).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerwatch_core::monitoring::FixError;

    #[test]
    fn test_error_mapping() {
        let missing = MonitoringError::AccountNotFound(CashBankAccountId::new());
        assert_eq!(AppError::from(missing).status_code(), 404);

        let failed = MonitoringError::from(CorrectionError::Fix(FixError::BatchFailed {
            failed: 1,
            total: 3,
            first_error: "stale".to_string(),
        }));
        assert_eq!(
            failed.to_string(),
            "1 of 3 corrections failed; batch rolled back"
        );
        assert_eq!(AppError::from(failed).status_code(), 422);
    }

    #[test]
    fn test_probe_error_keeps_message() {
        let err: ProbeError = MonitoringError::AccountNotFound(CashBankAccountId::new()).into();
        assert!(err.to_string().starts_with("Cash/bank account not found"));
    }
}
