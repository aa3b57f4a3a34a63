//! Alert classification and delivery.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::status::{DoublePostingStatus, SyncStatus};
use super::types::{DoublePostingReport, PostingInspection, SyncReport};

/// Urgency of an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertLevel {
    /// Needs attention at the next review.
    Warning,
    /// Needs attention today.
    High,
    /// Needs attention now.
    Critical,
}

impl AlertLevel {
    /// Returns the string representation of the level.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Warning => "WARNING",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator-facing alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Urgency.
    pub level: AlertLevel,
    /// Short headline.
    pub title: String,
    /// One line per contributing problem.
    pub details: Vec<String>,
    /// When the alert was raised.
    pub raised_at: DateTime<Utc>,
}

/// Destination for alerts.
pub trait AlertSink: Send + Sync {
    /// Delivers an alert. Delivery failures are the sink's concern.
    fn emit(&self, alert: &Alert);
}

/// Logs alerts: `WARNING` at warn level, `HIGH` and `CRITICAL` at error level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAlertSink;

impl AlertSink for TracingAlertSink {
    fn emit(&self, alert: &Alert) {
        let details = alert.details.join("; ");
        match alert.level {
            AlertLevel::Warning => tracing::warn!(
                level = %alert.level,
                title = %alert.title,
                details = %details,
                "Ledger alert"
            ),
            AlertLevel::High | AlertLevel::Critical => tracing::error!(
                level = %alert.level,
                title = %alert.title,
                details = %details,
                "Ledger alert"
            ),
        }
    }
}

/// Thresholds that turn check results into alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// A single drift of at least this much is critical.
    pub critical_difference: Decimal,
    /// A single drift of at least this much is high.
    pub high_difference: Decimal,
    /// More combined findings than this is high.
    pub max_tolerable_inconsistencies: usize,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            critical_difference: Decimal::from(1_000_000),
            high_difference: Decimal::from(100_000),
            max_tolerable_inconsistencies: 5,
        }
    }
}

impl AlertPolicy {
    /// Builds an alert for a cycle's results, or `None` when both are clean.
    #[must_use]
    pub fn evaluate(
        &self,
        sync: &SyncReport,
        double_posting: &DoublePostingReport,
        raised_at: DateTime<Utc>,
    ) -> Option<Alert> {
        if sync.status == SyncStatus::Ok && double_posting.status == DoublePostingStatus::Clean {
            return None;
        }

        let mut details = Vec::new();
        if sync.unsynchronized_accounts > 0 {
            details.push(format!(
                "{} of {} cash/bank accounts out of sync with GL (max difference {})",
                sync.unsynchronized_accounts,
                sync.total_accounts,
                sync.max_difference()
            ));
        }
        if double_posting.patterns_found > 0 {
            details.push(format!(
                "{} account(s) show a double posting pattern",
                double_posting.patterns_found
            ));
        }

        let max_difference = sync.max_difference();
        let total_findings = sync.unsynchronized_accounts + double_posting.patterns_found;
        let level = if max_difference >= self.critical_difference
            || double_posting.status == DoublePostingStatus::Critical
        {
            AlertLevel::Critical
        } else if max_difference >= self.high_difference
            || total_findings > self.max_tolerable_inconsistencies
            || sync.status == SyncStatus::Error
        {
            AlertLevel::High
        } else {
            AlertLevel::Warning
        };

        Some(Alert {
            level,
            title: format!(
                "Ledger monitoring: balance sync {}, double posting {}",
                sync.status, double_posting.status
            ),
            details,
            raised_at,
        })
    }

    /// Builds an alert for a suspicious posting inspection.
    #[must_use]
    pub fn inspection_alert(&self, inspection: &PostingInspection) -> Option<Alert> {
        if !inspection.is_suspicious() {
            return None;
        }

        let mut details = Vec::new();
        if inspection.multiple_transactions {
            details.push(format!(
                "{} transactions created for reference {}",
                inspection.transactions_found, inspection.reference_id
            ));
        }
        if inspection.amount_mismatch {
            details.push(format!(
                "Posted amount {} differs from expected {}",
                inspection.total_amount, inspection.expected_amount
            ));
        }
        if inspection.double_posting_pattern {
            details.push("Account balance is twice its transaction sum".to_string());
        }

        let level = if inspection.double_posting_pattern {
            AlertLevel::Critical
        } else {
            AlertLevel::High
        };

        Some(Alert {
            level,
            title: format!("Suspicious posting for reference {}", inspection.reference_id),
            details,
            raised_at: inspection.inspected_at,
        })
    }
}
