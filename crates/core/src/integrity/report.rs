//! Report assembly, health scoring and recommendations.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::severity::Severity;
use super::types::{
    BalanceHealthReport, CheckKind, CheckOutcome, ErroredCheck, SeverityCounts, SystemStatistics,
    ValidationReport,
};

impl ValidationReport {
    /// Builds a report from per-check results.
    ///
    /// Outcomes are placed in [`CheckKind`] order regardless of the order
    /// they are passed in. A check that returned an error contributes no
    /// findings and marks the report invalid.
    #[must_use]
    pub fn assemble(
        mut results: Vec<(CheckKind, Result<CheckOutcome, String>)>,
        validated_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        results.sort_by_key(|(kind, _)| *kind);

        let mut total_checks = 0;
        let mut inconsistencies = Vec::new();
        let mut errored_checks = Vec::new();

        for (check, result) in results {
            match result {
                Ok(outcome) => {
                    total_checks += outcome.checked;
                    inconsistencies.extend(outcome.findings);
                }
                Err(message) => errored_checks.push(ErroredCheck { check, message }),
            }
        }

        Self {
            valid: inconsistencies.is_empty() && errored_checks.is_empty(),
            total_checks,
            failed_checks: inconsistencies.len(),
            inconsistencies,
            errored_checks,
            validated_at,
            duration_ms,
        }
    }

    /// Counts findings per severity.
    #[must_use]
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for inconsistency in &self.inconsistencies {
            match inconsistency.severity() {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Medium => counts.medium += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    /// Percentage of passed checks, see [`health_score`].
    #[must_use]
    pub fn health_score(&self) -> Decimal {
        health_score(self.total_checks, self.failed_checks)
    }

    /// Equality ignoring timestamps and duration.
    #[must_use]
    pub fn same_findings(&self, other: &Self) -> bool {
        self.valid == other.valid
            && self.total_checks == other.total_checks
            && self.failed_checks == other.failed_checks
            && self.inconsistencies == other.inconsistencies
            && self.errored_checks == other.errored_checks
    }
}

/// `(total - failed) / total * 100`, rounded to two places; 0 when nothing was checked.
#[must_use]
pub fn health_score(total: usize, failed: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    let passed = Decimal::from(total.saturating_sub(failed));
    (passed * Decimal::ONE_HUNDRED / Decimal::from(total)).round_dp(2)
}

/// Produces operator advice for a validation result.
#[must_use]
pub fn recommendations(report: &ValidationReport) -> Vec<String> {
    if report.valid {
        return vec![
            "All balance validations passed - system is healthy".to_string(),
            "Keep routing balance updates through the posting pipeline".to_string(),
            "Schedule regular balance health checks".to_string(),
        ];
    }

    let mut advice = Vec::new();
    let counts = report.severity_counts();
    if counts.critical > 0 {
        advice.push(format!(
            "URGENT: Fix {} critical balance inconsistencies immediately",
            counts.critical
        ));
    }
    if counts.high > 0 {
        advice.push(format!(
            "Fix {} high priority balance inconsistencies",
            counts.high
        ));
    }
    if !report.errored_checks.is_empty() {
        let names: Vec<&str> = report
            .errored_checks
            .iter()
            .map(|errored| errored.check.as_str())
            .collect();
        advice.push(format!(
            "Re-run validation: checks failed to execute ({})",
            names.join(", ")
        ));
    }
    advice.push("Run balance integrity validation daily".to_string());
    advice.push("Enable automated GL synchronization in the monitor".to_string());
    advice
}

impl BalanceHealthReport {
    /// Wraps a validation report with statistics, score and advice.
    #[must_use]
    pub fn new(
        validation: ValidationReport,
        statistics: SystemStatistics,
        generated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            health_score: validation.health_score(),
            recommendations: recommendations(&validation),
            validation,
            statistics,
            generated_at,
        }
    }
}
