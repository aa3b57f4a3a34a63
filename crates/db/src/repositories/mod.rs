//! Repository abstractions for data access.
//!
//! Repositories load ledger rows, hand them to the pure logic in
//! `ledgerwatch-core` and persist what comes back. Cached balances are only
//! ever written by [`correction::CorrectionExecutor`] and equation auto-heal.

pub mod audit;
pub mod correction;
pub mod equation;
pub mod integrity;
mod ledger_rows;
pub mod monitoring;
pub mod reconciliation;

pub use audit::{AuditError, AuditTrailRepository, NewAuditEntry};
pub use correction::{BALANCE_CORRECTION, CorrectionContext, CorrectionError, CorrectionExecutor};
pub use equation::{EquationRepoError, EquationRepository};
pub use integrity::{IntegrityError, IntegrityRepository};
pub use monitoring::{MonitoringError, MonitoringRepository};
pub use reconciliation::{
    AUTO_GENERATED_NOTE, GenerateSnapshotInput, PerformReconciliationInput,
    ReconciliationRepoError, ReconciliationRepository, ReconciliationWithDifferences,
    SnapshotVerification, SnapshotWithTransactions,
};
