//! Periodic monitoring worker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use ledgerwatch_shared::config::MonitoringConfig;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::alert::{AlertPolicy, AlertSink};
use super::deadline::with_deadline;
use super::error::MonitorError;
use super::guard::CycleGuard;
use super::probe::MonitorProbe;
use super::status::CycleState;
use super::types::{CycleReport, MonitoringStatus};

/// Scheduler tunables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Whether [`MonitoringScheduler::run`] ticks at all.
    pub enabled: bool,
    /// Time between cycle starts.
    pub interval: Duration,
    /// Sync drifted GL mirrors at the end of a degraded cycle.
    pub auto_fix: bool,
    /// Deadline for one whole cycle.
    pub cycle_timeout: Option<Duration>,
    /// Alert thresholds.
    pub policy: AlertPolicy,
}

impl From<&MonitoringConfig> for SchedulerSettings {
    fn from(config: &MonitoringConfig) -> Self {
        Self {
            enabled: config.enabled,
            interval: config.interval(),
            auto_fix: config.auto_fix,
            cycle_timeout: Some(config.operation_timeout()),
            policy: AlertPolicy {
                critical_difference: config.critical_balance_difference,
                high_difference: config.high_balance_difference,
                max_tolerable_inconsistencies: config.max_tolerable_inconsistencies,
            },
        }
    }
}

#[derive(Debug, Clone)]
struct StatusCell {
    state: CycleState,
    last_check: Option<DateTime<Utc>>,
    last_verdict: Option<CycleState>,
    last_error: Option<String>,
}

impl Default for StatusCell {
    fn default() -> Self {
        Self {
            state: CycleState::Idle,
            last_check: None,
            last_verdict: None,
            last_error: None,
        }
    }
}

/// Runs the balance-sync check and the double-posting detector on a fixed
/// interval, raises alerts and optionally syncs drifted GL mirrors.
pub struct MonitoringScheduler<P: MonitorProbe> {
    probe: Arc<P>,
    guard: CycleGuard,
    sink: Arc<dyn AlertSink>,
    settings: SchedulerSettings,
    status: Arc<RwLock<StatusCell>>,
}

impl<P: MonitorProbe> MonitoringScheduler<P> {
    /// Creates a scheduler.
    ///
    /// `guard` should be the same guard manual fix requests acquire.
    pub fn new(
        probe: Arc<P>,
        settings: SchedulerSettings,
        sink: Arc<dyn AlertSink>,
        guard: CycleGuard,
    ) -> Self {
        Self {
            probe,
            guard,
            sink,
            settings,
            status: Arc::new(RwLock::new(StatusCell::default())),
        }
    }

    /// The guard shared with manual fixes.
    #[must_use]
    pub const fn guard(&self) -> &CycleGuard {
        &self.guard
    }

    /// Runs a single cycle.
    ///
    /// Returns [`MonitorError::Busy`] without touching the ledger when the
    /// guard is held. A failed auto-fix is reported in the cycle report and
    /// does not fail the cycle.
    pub async fn run_once(&self) -> Result<CycleReport, MonitorError> {
        let Some(_permit) = self.guard.try_acquire() else {
            return Err(MonitorError::Busy);
        };

        let started_at = Utc::now();
        self.status.write().await.state = CycleState::Checking;

        let result = with_deadline(
            self.settings.cycle_timeout,
            "monitoring_cycle",
            self.cycle(started_at),
        )
        .await;

        let mut status = self.status.write().await;
        status.last_check = Some(started_at);
        match &result {
            Ok(report) => {
                status.last_verdict = Some(report.verdict);
                status.last_error = None;
            }
            Err(e) => {
                status.last_error = Some(e.to_string());
            }
        }
        status.state = CycleState::Idle;

        result
    }

    async fn cycle(&self, started_at: DateTime<Utc>) -> Result<CycleReport, MonitorError> {
        let sync = self
            .probe
            .check_balance_sync()
            .await
            .map_err(MonitorError::Probe)?;
        let double_posting = self
            .probe
            .detect_double_posting()
            .await
            .map_err(MonitorError::Probe)?;

        let verdict = CycleState::from_results(sync.status, double_posting.status);
        if let Some(alert) = self
            .settings
            .policy
            .evaluate(&sync, &double_posting, Utc::now())
        {
            self.sink.emit(&alert);
        }

        let (fix, fix_error) = if self.settings.auto_fix && !sync.discrepancies.is_empty() {
            match self.probe.apply_gl_sync(&sync).await {
                Ok(summary) => {
                    tracing::info!(
                        applied = summary.applied,
                        attempted = summary.attempted,
                        "Auto-fix synchronized GL balances"
                    );
                    (Some(summary), None)
                }
                Err(e) => {
                    tracing::error!(error = %e, "Auto-fix failed; batch rolled back");
                    (None, Some(e.to_string()))
                }
            }
        } else {
            (None, None)
        };

        Ok(CycleReport {
            started_at,
            finished_at: Utc::now(),
            verdict,
            sync,
            double_posting,
            fix,
            fix_error,
        })
    }

    /// Ticks until `cancel` fires. Missed ticks are skipped, as are ticks
    /// that find a cycle (or a manual fix) in flight.
    pub async fn run(&self, cancel: CancellationToken) {
        if !self.settings.enabled {
            tracing::info!("Monitoring disabled by configuration");
            return;
        }

        tracing::info!(
            interval_secs = self.settings.interval.as_secs(),
            auto_fix = self.settings.auto_fix,
            "Starting ledger monitoring"
        );

        let mut interval = tokio::time::interval(self.settings.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!("Ledger monitoring shutting down");
                    break;
                }
                _ = interval.tick() => {
                    match self.run_once().await {
                        Ok(report) => tracing::info!(
                            verdict = %report.verdict,
                            sync_status = %report.sync.status,
                            unsynchronized = report.sync.unsynchronized_accounts,
                            double_posting_status = %report.double_posting.status,
                            patterns_found = report.double_posting.patterns_found,
                            "Monitoring cycle completed"
                        ),
                        Err(MonitorError::Busy) => {
                            tracing::debug!("Previous cycle still running; tick skipped");
                        }
                        Err(e) => tracing::error!(
                            error = %e,
                            code = e.error_code(),
                            "Monitoring cycle failed"
                        ),
                    }
                }
            }
        }
    }

    /// Configuration and last-cycle snapshot.
    pub async fn status(&self) -> MonitoringStatus {
        let cell = self.status.read().await.clone();
        MonitoringStatus {
            enabled: self.settings.enabled,
            state: cell.state,
            last_check: cell.last_check,
            last_verdict: cell.last_verdict,
            last_error: cell.last_error,
            interval_secs: self.settings.interval.as_secs(),
            auto_fix: self.settings.auto_fix,
            critical_balance_difference: self.settings.policy.critical_difference,
            high_balance_difference: self.settings.policy.high_difference,
            max_tolerable_inconsistencies: self.settings.policy.max_tolerable_inconsistencies,
        }
    }
}
