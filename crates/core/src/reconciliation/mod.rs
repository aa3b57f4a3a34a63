//! Snapshot-based bank reconciliation.
//!
//! This module implements:
//! - Calendar month periods and their half-open windows
//! - Snapshot content building with a tamper-evident SHA-256 hash
//! - The diff engine comparing two snapshots
//! - The review workflow (PENDING → APPROVED / REJECTED)

pub mod diff;
pub mod error;
pub mod period;
pub mod snapshot;
pub mod types;
pub mod workflow;

pub use diff::compare;
pub use error::ReconciliationError;
pub use period::Period;
pub use types::{
    Difference, DifferenceType, FrozenTransaction, LedgerTransaction, ReconciliationStatus,
    ReconciliationSummary, SnapshotContent, SnapshotStatus,
};
pub use workflow::{ReconciliationWorkflow, reconciliation_number};
