//! Operator surface over every repository.
//!
//! Each call runs under the configured operation deadline and returns the
//! shared [`AppError`]. The engine owns the single [`CycleGuard`] that the
//! monitoring scheduler and manual fixes contend for.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ledgerwatch_core::equation::{EquationDetail, EquationReport, HealOptions, HealOutcome};
use ledgerwatch_core::integrity::{BalanceHealthReport, ValidationReport};
use ledgerwatch_core::monitoring::{
    AlertSink, BalanceHealth, CycleGuard, CycleReport, DoublePostingReport,
    FixSummary, MonitoringScheduler, MonitoringStatus, PostingInspection, SchedulerSettings,
    SyncReport, with_deadline,
};
use ledgerwatch_core::reconciliation::Period;
use ledgerwatch_shared::config::AppConfig;
use ledgerwatch_shared::error::{AppError, AppResult};
use ledgerwatch_shared::types::{
    CashBankAccountId, PageRequest, PageResponse, ReconciliationId, SnapshotId, UserId,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

use crate::entities::{bank_reconciliations, cash_bank_audit_trail, reconciliation_snapshots};
use crate::repositories::{
    AuditTrailRepository, EquationRepository, GenerateSnapshotInput, IntegrityRepository,
    MonitoringRepository, NewAuditEntry, PerformReconciliationInput, ReconciliationRepository,
    ReconciliationWithDifferences, SnapshotVerification, SnapshotWithTransactions,
};

/// The consistency and reconciliation engine.
pub struct LedgerEngine {
    integrity: IntegrityRepository,
    equation: EquationRepository,
    reconciliation: ReconciliationRepository,
    monitoring: Arc<MonitoringRepository>,
    audit: AuditTrailRepository,
    scheduler: Arc<MonitoringScheduler<MonitoringRepository>>,
    guard: CycleGuard,
    deadline: Option<Duration>,
}

impl LedgerEngine {
    /// Builds the engine and its scheduler from configuration.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the integrity thresholds are invalid.
    pub fn new(
        db: DatabaseConnection,
        config: &AppConfig,
        sink: Arc<dyn AlertSink>,
    ) -> AppResult<Self> {
        let integrity = IntegrityRepository::new(db.clone(), &config.integrity)?;
        let tolerance = config.integrity.tolerance;
        let settings = SchedulerSettings::from(&config.monitoring);

        let monitoring = Arc::new(MonitoringRepository::new(
            db.clone(),
            tolerance,
            settings.policy,
            Arc::clone(&sink),
        ));
        let guard = CycleGuard::new();
        let deadline = settings.cycle_timeout;
        let scheduler = Arc::new(MonitoringScheduler::new(
            Arc::clone(&monitoring),
            settings,
            sink,
            guard.clone(),
        ));

        Ok(Self {
            integrity,
            equation: EquationRepository::new(
                db.clone(),
                tolerance,
                HealOptions::from(&config.equation),
            ),
            reconciliation: ReconciliationRepository::new(db.clone()),
            monitoring,
            audit: AuditTrailRepository::new(db),
            scheduler,
            guard,
            deadline,
        })
    }

    /// The periodic scheduler; drive it with [`MonitoringScheduler::run`].
    #[must_use]
    pub fn scheduler(&self) -> Arc<MonitoringScheduler<MonitoringRepository>> {
        Arc::clone(&self.scheduler)
    }

    /// The guard shared by monitoring cycles and manual fixes.
    #[must_use]
    pub const fn guard(&self) -> &CycleGuard {
        &self.guard
    }

    async fn bounded<T, E, F>(&self, operation: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, E>>,
        AppError: From<E>,
    {
        with_deadline(self.deadline, operation, async move {
            fut.await.map_err(AppError::from)
        })
        .await
    }

    // ========================================================================
    // Balance integrity
    // ========================================================================

    /// Runs all four balance integrity checks.
    pub async fn validate_all_balances(&self) -> AppResult<ValidationReport> {
        self.bounded("validate_all_balances", self.integrity.validate_all())
            .await
    }

    /// Validation plus statistics, health score and recommendations.
    pub async fn balance_health_report(&self) -> AppResult<BalanceHealthReport> {
        self.bounded("balance_health_report", self.integrity.balance_health_report())
            .await
    }

    /// Plans and (unless `dry_run`) applies corrections for current findings.
    ///
    /// Fails with a retryable busy error while a monitoring cycle runs.
    pub async fn fix_inconsistencies(
        &self,
        dry_run: bool,
        actor: Option<UserId>,
    ) -> AppResult<FixSummary> {
        self.bounded(
            "fix_inconsistencies",
            self.integrity.fix_inconsistencies(&self.guard, dry_run, actor),
        )
        .await
    }

    // ========================================================================
    // Accounting equation
    // ========================================================================

    /// Checks the accounting equation.
    pub async fn validate_equation(&self) -> AppResult<EquationReport> {
        self.bounded("validate_equation", self.equation.validate())
            .await
    }

    /// Equation check with account breakdown and advice.
    pub async fn equation_report(&self) -> AppResult<EquationDetail> {
        self.bounded("equation_report", self.equation.equation_report())
            .await
    }

    /// Fails when the equation no longer holds after `reference` was posted.
    pub async fn validate_after_transaction(&self, reference: &str) -> AppResult<EquationReport> {
        self.bounded(
            "validate_after_transaction",
            self.equation.validate_after_transaction(reference),
        )
        .await
    }

    /// Runs auto-heal with explicit options.
    ///
    /// Shares the cycle guard with monitoring and fixes, so it never runs
    /// alongside a correction batch.
    pub async fn auto_heal(&self, options: &HealOptions) -> AppResult<HealOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Err(heal_busy());
        };
        self.bounded("auto_heal", self.equation.auto_heal(options))
            .await
    }

    /// Runs auto-heal with the configured options and logs the outcome.
    ///
    /// Skipped with [`AppError::Busy`] while a monitoring cycle or fix holds
    /// the guard.
    pub async fn scheduled_health_check(&self) -> AppResult<HealOutcome> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Err(heal_busy());
        };
        self.bounded(
            "scheduled_health_check",
            self.equation.scheduled_health_check(),
        )
        .await
    }

    // ========================================================================
    // Snapshots and reconciliation
    // ========================================================================

    /// Freezes an account's ledger for a period.
    pub async fn generate_snapshot(
        &self,
        input: GenerateSnapshotInput,
    ) -> AppResult<SnapshotWithTransactions> {
        self.bounded(
            "generate_snapshot",
            self.reconciliation.generate_snapshot(input),
        )
        .await
    }

    /// Lists an account's snapshots, newest first.
    pub async fn list_snapshots(
        &self,
        cash_bank_id: CashBankAccountId,
        period: Option<Period>,
    ) -> AppResult<Vec<reconciliation_snapshots::Model>> {
        self.bounded(
            "list_snapshots",
            self.reconciliation.list_snapshots(cash_bank_id, period),
        )
        .await
    }

    /// Gets a snapshot with its frozen rows.
    pub async fn get_snapshot(&self, snapshot_id: SnapshotId) -> AppResult<SnapshotWithTransactions> {
        self.bounded("get_snapshot", self.reconciliation.get_snapshot(snapshot_id))
            .await
    }

    /// Re-hashes a stored snapshot.
    pub async fn verify_snapshot(&self, snapshot_id: SnapshotId) -> AppResult<SnapshotVerification> {
        self.bounded(
            "verify_snapshot",
            self.reconciliation.verify_snapshot(snapshot_id),
        )
        .await
    }

    /// Seals a snapshot.
    pub async fn lock_snapshot(
        &self,
        snapshot_id: SnapshotId,
        locked_by: UserId,
    ) -> AppResult<reconciliation_snapshots::Model> {
        self.bounded(
            "lock_snapshot",
            self.reconciliation.lock_snapshot(snapshot_id, locked_by),
        )
        .await
    }

    /// Deletes an unlocked, unreferenced snapshot.
    pub async fn delete_snapshot(&self, snapshot_id: SnapshotId) -> AppResult<()> {
        self.bounded(
            "delete_snapshot",
            self.reconciliation.delete_snapshot(snapshot_id),
        )
        .await
    }

    /// Compares two snapshots and stores a PENDING reconciliation.
    pub async fn perform_reconciliation(
        &self,
        input: PerformReconciliationInput,
    ) -> AppResult<ReconciliationWithDifferences> {
        self.bounded(
            "perform_reconciliation",
            self.reconciliation.perform_reconciliation(input),
        )
        .await
    }

    /// Approves a pending reconciliation.
    pub async fn approve_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
        reviewer: UserId,
        notes: Option<String>,
    ) -> AppResult<bank_reconciliations::Model> {
        self.bounded(
            "approve_reconciliation",
            self.reconciliation
                .approve_reconciliation(reconciliation_id, reviewer, notes),
        )
        .await
    }

    /// Rejects a pending reconciliation with a reason.
    pub async fn reject_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
        reviewer: UserId,
        reason: &str,
    ) -> AppResult<bank_reconciliations::Model> {
        self.bounded(
            "reject_reconciliation",
            self.reconciliation
                .reject_reconciliation(reconciliation_id, reviewer, reason),
        )
        .await
    }

    /// Lists an account's reconciliations, newest first.
    pub async fn list_reconciliations(
        &self,
        cash_bank_id: CashBankAccountId,
        page: PageRequest,
    ) -> AppResult<PageResponse<bank_reconciliations::Model>> {
        self.bounded(
            "list_reconciliations",
            self.reconciliation.list_reconciliations(cash_bank_id, page),
        )
        .await
    }

    /// Gets a reconciliation with its differences.
    pub async fn get_reconciliation(
        &self,
        reconciliation_id: ReconciliationId,
    ) -> AppResult<ReconciliationWithDifferences> {
        self.bounded(
            "get_reconciliation",
            self.reconciliation.get_reconciliation(reconciliation_id),
        )
        .await
    }

    // ========================================================================
    // Monitoring
    // ========================================================================

    /// Compares every active cash/bank account with its GL mirror.
    pub async fn check_balance_sync(&self) -> AppResult<SyncReport> {
        self.bounded("check_balance_sync", self.monitoring.balance_sync())
            .await
    }

    /// Runs the double-posting detector.
    pub async fn detect_double_posting(&self) -> AppResult<DoublePostingReport> {
        self.bounded("detect_double_posting", self.monitoring.double_posting())
            .await
    }

    /// Sync status summary.
    pub async fn balance_health(&self) -> AppResult<BalanceHealth> {
        self.bounded("balance_health", self.monitoring.balance_health())
            .await
    }

    /// Inspects one posting for duplicate lines, amount drift and doubling.
    pub async fn inspect_posting(
        &self,
        reference_id: &str,
        cash_bank_id: CashBankAccountId,
        expected_amount: Decimal,
    ) -> AppResult<PostingInspection> {
        self.bounded(
            "inspect_posting",
            self.monitoring
                .inspect_posting(reference_id, cash_bank_id, expected_amount),
        )
        .await
    }

    /// Runs one monitoring cycle now, outside the schedule.
    pub async fn run_monitoring_cycle(&self) -> AppResult<CycleReport> {
        Ok(self.scheduler.run_once().await?)
    }

    /// Scheduler configuration and last-cycle outcome.
    pub async fn monitoring_status(&self) -> MonitoringStatus {
        self.scheduler.status().await
    }

    // ========================================================================
    // Audit trail
    // ========================================================================

    /// Appends an audit record.
    pub async fn log_audit_trail(
        &self,
        entry: NewAuditEntry,
    ) -> AppResult<cash_bank_audit_trail::Model> {
        self.bounded("log_audit_trail", self.audit.log_audit_trail(entry))
            .await
    }

    /// Lists an account's audit records, newest first.
    pub async fn audit_trail(
        &self,
        cash_bank_id: CashBankAccountId,
        page: PageRequest,
    ) -> AppResult<PageResponse<cash_bank_audit_trail::Model>> {
        self.bounded("audit_trail", self.audit.audit_trail(cash_bank_id, page))
            .await
    }
}

fn heal_busy() -> AppError {
    AppError::Busy("monitoring cycle or fix in progress; auto-heal skipped".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerwatch_core::monitoring::{CycleState, TracingAlertSink};
    use ledgerwatch_shared::config::{
        DatabaseConfig, EquationConfig, IntegrityConfig, LogConfig, MonitoringConfig,
    };
    use rust_decimal_macros::dec;

    fn config() -> AppConfig {
        AppConfig {
            database: DatabaseConfig {
                url: "postgres://localhost/ledger".to_string(),
                max_connections: 5,
                min_connections: 1,
            },
            integrity: IntegrityConfig::default(),
            monitoring: MonitoringConfig {
                interval_secs: 60,
                auto_fix: true,
                ..MonitoringConfig::default()
            },
            equation: EquationConfig::default(),
            log: LogConfig::default(),
        }
    }

    fn engine() -> LedgerEngine {
        LedgerEngine::new(
            DatabaseConnection::Disconnected,
            &config(),
            Arc::new(TracingAlertSink),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_status_reflects_config() {
        let engine = engine();
        let status = engine.monitoring_status().await;

        assert!(status.enabled);
        assert!(status.auto_fix);
        assert_eq!(status.interval_secs, 60);
        assert_eq!(status.state, CycleState::Idle);
        assert_eq!(status.critical_balance_difference, dec!(1000000));
        assert!(status.last_check.is_none());
        assert_eq!(status.high_balance_difference, dec!(100000));
    }

    #[tokio::test]
    async fn test_manual_fix_rejected_while_cycle_holds_guard() {
        let engine = engine();
        let _cycle = engine.guard().try_acquire().unwrap();

        let err = engine.fix_inconsistencies(true, None).await.unwrap_err();
        assert_eq!(err.error_code(), "BUSY");
        assert!(err.is_retryable());

        let err = engine.run_monitoring_cycle().await.unwrap_err();
        assert_eq!(err.error_code(), "BUSY");
    }

    #[tokio::test]
    async fn test_heal_skipped_while_fix_holds_guard() {
        let engine = engine();
        let _fix = engine.guard().try_acquire().unwrap();

        let err = engine.scheduled_health_check().await.unwrap_err();
        assert_eq!(err.error_code(), "BUSY");
        assert!(err.is_retryable());

        let err = engine
            .auto_heal(&HealOptions::from(&EquationConfig::default()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "BUSY");
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let mut config = config();
        config.integrity.minor_threshold = dec!(5000000);
        let result = LedgerEngine::new(
            DatabaseConnection::Disconnected,
            &config,
            Arc::new(TracingAlertSink),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
