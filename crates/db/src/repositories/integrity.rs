//! Balance integrity repository.
//!
//! Loads the rows each check needs, runs the pure checks from
//! `ledgerwatch-core` and assembles the validation report. Manual fixes go
//! through the shared [`CycleGuard`] and the [`CorrectionExecutor`].

use std::time::Instant;

use chrono::Utc;
use ledgerwatch_core::integrity::{
    BalanceHealthReport, CheckKind, CheckOutcome, ConsistencyError, SeverityThresholds,
    SystemStatistics, ValidationReport, check_double_posting, check_gl_mirror,
    check_journal_balance, check_transaction_sums,
};
use ledgerwatch_core::monitoring::{CycleGuard, FixError, FixSummary, plan_fixes};
use ledgerwatch_shared::config::IntegrityConfig;
use ledgerwatch_shared::error::AppError;
use ledgerwatch_shared::types::UserId;
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement};
use tracing::{info, instrument, warn};

use super::correction::{CorrectionContext, CorrectionError, CorrectionExecutor};
use super::ledger_rows::{self, is_connection_error};

const STATISTICS_SQL: &str = r"
SELECT
    (SELECT COUNT(*) FROM cash_bank_accounts WHERE is_active) AS total_cash_banks,
    (SELECT COALESCE(SUM(balance), 0) FROM cash_bank_accounts WHERE is_active) AS total_balance,
    (SELECT COUNT(*) FROM cash_bank_transactions) AS total_transactions,
    (SELECT COUNT(*) FROM journal_entries) AS total_journal_entries
";

#[derive(Debug, FromQueryResult)]
struct StatisticsRow {
    total_cash_banks: i64,
    total_balance: Decimal,
    total_transactions: i64,
    total_journal_entries: i64,
}

impl From<StatisticsRow> for SystemStatistics {
    fn from(row: StatisticsRow) -> Self {
        Self {
            total_cash_banks: row.total_cash_banks.unsigned_abs(),
            total_balance: row.total_balance,
            total_transactions: row.total_transactions.unsigned_abs(),
            total_journal_entries: row.total_journal_entries.unsigned_abs(),
        }
    }
}

/// Error types for integrity operations.
#[derive(Debug, thiserror::Error)]
pub enum IntegrityError {
    /// Thresholds or tolerance are invalid.
    #[error(transparent)]
    Config(#[from] ConsistencyError),

    /// A monitoring cycle or another fix holds the guard.
    #[error("a monitoring cycle or fix is already in progress")]
    MonitorBusy,

    /// The correction batch failed and was rolled back.
    #[error(transparent)]
    Fix(#[from] FixError),

    /// An account vanished while corrections were applied.
    #[error("{0}")]
    NotFound(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl IntegrityError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(e) => e.error_code(),
            Self::MonitorBusy => "MONITOR_BUSY",
            Self::Fix(e) => e.error_code(),
            Self::NotFound(_) => "NOT_FOUND",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::Config(_) => 400,
            Self::MonitorBusy => 503,
            Self::Fix(FixError::StaleBalance { .. }) => 409,
            Self::Fix(FixError::BatchFailed { .. }) => 422,
            Self::NotFound(_) => 404,
            Self::Database(_) => 500,
        }
    }
}

impl From<CorrectionError> for IntegrityError {
    fn from(err: CorrectionError) -> Self {
        match err {
            CorrectionError::Fix(e) => Self::Fix(e),
            CorrectionError::Database(e) => Self::Database(e),
            other @ (CorrectionError::AccountNotFound(_)
            | CorrectionError::GlAccountNotFound(_)) => Self::NotFound(other.to_string()),
        }
    }
}

impl From<IntegrityError> for AppError {
    fn from(err: IntegrityError) -> Self {
        match &err {
            IntegrityError::Config(_) => Self::Validation(err.to_string()),
            IntegrityError::MonitorBusy => Self::Busy(err.to_string()),
            IntegrityError::Fix(FixError::StaleBalance { .. }) => Self::Conflict(err.to_string()),
            IntegrityError::Fix(FixError::BatchFailed { .. }) => {
                Self::BusinessRule(err.to_string())
            }
            IntegrityError::NotFound(_) => Self::NotFound(err.to_string()),
            IntegrityError::Database(e) => Self::Database(e.to_string()),
        }
    }
}

/// Balance integrity repository.
#[derive(Debug, Clone)]
pub struct IntegrityRepository {
    db: DatabaseConnection,
    thresholds: SeverityThresholds,
    tolerance: Decimal,
    executor: CorrectionExecutor,
}

impl IntegrityRepository {
    /// Creates a new integrity repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured thresholds or tolerance are invalid.
    pub fn new(db: DatabaseConnection, config: &IntegrityConfig) -> Result<Self, IntegrityError> {
        let thresholds =
            SeverityThresholds::new(config.critical_threshold, config.minor_threshold)?;
        if config.tolerance.is_sign_negative() {
            return Err(ConsistencyError::InvalidTolerance(config.tolerance).into());
        }

        Ok(Self {
            executor: CorrectionExecutor::new(db.clone()),
            db,
            thresholds,
            tolerance: config.tolerance,
        })
    }

    /// Runs all four integrity checks.
    ///
    /// A failing query is recorded against its check and the remaining
    /// checks still run.
    ///
    /// # Errors
    ///
    /// Returns an error only when the database is unreachable.
    #[instrument(skip(self))]
    pub async fn validate_all(&self) -> Result<ValidationReport, IntegrityError> {
        let validated_at = Utc::now();
        let started = Instant::now();

        let sums = loaded(ledger_rows::cash_bank_sums(&self.db).await)?;
        let mirrors = loaded(ledger_rows::cash_bank_gl(&self.db).await)?;
        let journals = loaded(ledger_rows::posted_journal_totals(&self.db).await)?;

        let results = vec![
            (
                CheckKind::CashBankTransaction,
                run_check(&sums, |rows| check_transaction_sums(rows, &self.thresholds)),
            ),
            (
                CheckKind::CashBankGl,
                run_check(&mirrors, |rows| check_gl_mirror(rows, &self.thresholds)),
            ),
            (
                CheckKind::JournalBalance,
                run_check(&journals, |rows| check_journal_balance(rows, self.tolerance)),
            ),
            (
                CheckKind::DoublePosting,
                run_check(&sums, |rows| check_double_posting(rows, self.tolerance)),
            ),
        ];

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let report = ValidationReport::assemble(results, validated_at, duration_ms);
        let counts = report.severity_counts();

        if report.valid {
            info!(
                total_checks = report.total_checks,
                duration_ms, "Balance validation passed"
            );
        } else {
            warn!(
                total_checks = report.total_checks,
                failed_checks = report.failed_checks,
                errored_checks = report.errored_checks.len(),
                critical = counts.critical,
                high = counts.high,
                medium = counts.medium,
                low = counts.low,
                duration_ms,
                "Balance validation found inconsistencies"
            );
        }

        Ok(report)
    }

    /// Validation report plus statistics, health score and recommendations.
    ///
    /// # Errors
    ///
    /// Returns an error when the database is unreachable or the statistics
    /// query fails.
    #[instrument(skip(self))]
    pub async fn balance_health_report(&self) -> Result<BalanceHealthReport, IntegrityError> {
        let validation = self.validate_all().await?;
        let statistics = StatisticsRow::find_by_statement(Statement::from_string(
            DbBackend::Postgres,
            STATISTICS_SQL,
        ))
        .one(&self.db)
        .await?
        .map(SystemStatistics::from)
        .unwrap_or_default();

        Ok(BalanceHealthReport::new(validation, statistics, Utc::now()))
    }

    /// Validates, plans corrections and (unless `dry_run`) applies them.
    ///
    /// Holds the monitoring guard for the whole run.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::MonitorBusy`] if a monitoring cycle is in
    /// flight, or the executor's error if the batch was rolled back.
    #[instrument(skip(self, guard))]
    pub async fn fix_inconsistencies(
        &self,
        guard: &CycleGuard,
        dry_run: bool,
        actor: Option<UserId>,
    ) -> Result<FixSummary, IntegrityError> {
        let Some(_permit) = guard.try_acquire() else {
            return Err(IntegrityError::MonitorBusy);
        };

        let report = self.validate_all().await?;
        let plan = plan_fixes(&report.inconsistencies);

        if dry_run || plan.corrections.is_empty() {
            info!(
                corrections = plan.corrections.len(),
                manual_review = plan.manual_review.len(),
                "Fix plan previewed"
            );
            let mut summary = FixSummary::preview(plan);
            summary.dry_run = dry_run;
            return Ok(summary);
        }

        let context = CorrectionContext {
            actor,
            reason: "Manual balance integrity fix".to_string(),
        };
        self.executor.apply(&plan.corrections, &context).await?;

        let summary = FixSummary::applied(plan);
        info!(
            applied = summary.applied,
            manual_review = summary.manual_review.len(),
            "Balance inconsistencies fixed"
        );
        Ok(summary)
    }
}

/// Keeps a query failure as an errored check unless the store is unreachable.
fn loaded<T>(rows: Result<Vec<T>, DbErr>) -> Result<Result<Vec<T>, String>, IntegrityError> {
    match rows {
        Ok(rows) => Ok(Ok(rows)),
        Err(e) if is_connection_error(&e) => Err(IntegrityError::Database(e)),
        Err(e) => Ok(Err(e.to_string())),
    }
}

fn run_check<T>(
    rows: &Result<Vec<T>, String>,
    check: impl FnOnce(&[T]) -> CheckOutcome,
) -> Result<CheckOutcome, String> {
    rows.as_ref().map(|rows| check(rows)).map_err(Clone::clone)
}
