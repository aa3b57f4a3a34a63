//! The scheduler's view of the ledger.

use async_trait::async_trait;

use super::error::ProbeError;
use super::fix::FixSummary;
use super::types::{DoublePostingReport, SyncReport};

/// Checks and corrective writes the scheduler drives.
///
/// Implemented over the database in `ledgerwatch-db`; mocked in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MonitorProbe: Send + Sync + 'static {
    /// Compares every active cash/bank account with its GL mirror.
    async fn check_balance_sync(&self) -> Result<SyncReport, ProbeError>;

    /// Runs the double-posting detector over every active cash/bank account.
    async fn detect_double_posting(&self) -> Result<DoublePostingReport, ProbeError>;

    /// Syncs each drifted GL mirror to its cash/bank balance in one transaction.
    async fn apply_gl_sync(&self, report: &SyncReport) -> Result<FixSummary, ProbeError>;
}
