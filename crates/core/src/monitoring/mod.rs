//! Ledger monitoring and corrective writes.
//!
//! This module implements:
//! - Balance sync and double-posting status classification
//! - Fix planning (automatic corrections vs manual review)
//! - Alert policy and delivery
//! - The periodic scheduler, generic over a [`MonitorProbe`]

pub mod alert;
pub mod deadline;
pub mod error;
pub mod fix;
pub mod guard;
pub mod probe;
pub mod scheduler;
pub mod status;
pub mod types;

pub use alert::{Alert, AlertLevel, AlertPolicy, AlertSink, TracingAlertSink};
pub use deadline::{DeadlineExceeded, with_deadline};
pub use error::{MonitorError, ProbeError};
pub use fix::{
    Correction, FixError, FixPlan, FixSummary, ManualReviewItem, corrections_from_sync, plan_fixes,
};
pub use guard::CycleGuard;
pub use probe::MonitorProbe;
pub use scheduler::{MonitoringScheduler, SchedulerSettings};
pub use status::{CycleState, DoublePostingStatus, SyncStatus};
pub use types::{
    BalanceHealth, CycleReport, DoublePostingReport, MonitoringStatus, PostingInspection,
    PostingObservation, SyncDiscrepancy, SyncReport,
};
