//! Fix planning for detected inconsistencies.
//!
//! The planner decides what the executor may write. Only two findings have
//! an unambiguous authority and get an automatic correction:
//! - GL drift: the cash/bank balance wins and the GL mirror is overwritten
//! - Double posting: the balance is halved and the GL re-mirrored
//!
//! Everything else is routed to manual review.

use std::collections::HashSet;

use ledgerwatch_shared::types::{CashBankAccountId, GlAccountId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::SyncReport;
use crate::integrity::Inconsistency;

/// A corrective write the executor may apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Correction {
    /// Overwrite the GL balance with the cash/bank balance.
    SyncGl {
        /// Authoritative cash/bank account.
        cash_bank_id: CashBankAccountId,
        /// Cash/bank account code.
        code: String,
        /// GL mirror to overwrite.
        gl_account_id: GlAccountId,
        /// Cash/bank balance observed at planning time.
        target_balance: Decimal,
    },
    /// Halve a double-posted balance and re-mirror the GL.
    HalveDoublePosting {
        /// Affected cash/bank account.
        cash_bank_id: CashBankAccountId,
        /// Cash/bank account code.
        code: String,
        /// GL mirror to re-sync.
        gl_account_id: GlAccountId,
        /// Balance observed at planning time.
        observed_balance: Decimal,
        /// Balance after the correction.
        corrected_balance: Decimal,
    },
}

impl Correction {
    /// Builds the halving correction for an observed balance.
    #[must_use]
    pub fn halve(
        cash_bank_id: CashBankAccountId,
        code: impl Into<String>,
        gl_account_id: GlAccountId,
        observed_balance: Decimal,
    ) -> Self {
        Self::HalveDoublePosting {
            cash_bank_id,
            code: code.into(),
            gl_account_id,
            observed_balance,
            corrected_balance: (observed_balance / Decimal::TWO).round_dp(2),
        }
    }

    /// Cash/bank account the correction concerns.
    #[must_use]
    pub const fn cash_bank_id(&self) -> CashBankAccountId {
        match self {
            Self::SyncGl { cash_bank_id, .. } | Self::HalveDoublePosting { cash_bank_id, .. } => {
                *cash_bank_id
            }
        }
    }

    /// Cash/bank account code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::SyncGl { code, .. } | Self::HalveDoublePosting { code, .. } => code,
        }
    }

    /// Strategy name used in logs and audit rows.
    #[must_use]
    pub const fn strategy(&self) -> &'static str {
        match self {
            Self::SyncGl { .. } => "SYNC_GL",
            Self::HalveDoublePosting { .. } => "HALVE_DOUBLE_POSTING",
        }
    }
}

/// A finding the executor will not touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualReviewItem {
    /// The finding.
    pub inconsistency: Inconsistency,
    /// Why no automatic correction applies.
    pub reason: String,
}

/// Corrections to apply plus findings left for an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixPlan {
    /// Halvings first, then GL syncs, each group ordered by account code.
    pub corrections: Vec<Correction>,
    /// Findings routed to manual review.
    pub manual_review: Vec<ManualReviewItem>,
}

impl FixPlan {
    /// True when nothing is to be written and nothing needs review.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.corrections.is_empty() && self.manual_review.is_empty()
    }
}

/// Plans corrections for a validation report's findings.
///
/// A double-posted account gets a single halving correction that also
/// re-mirrors its GL, so a GL drift on the same account is not planned
/// separately, and its transaction-sum mismatch is covered by the halving.
#[must_use]
pub fn plan_fixes(findings: &[Inconsistency]) -> FixPlan {
    let doubled: HashSet<CashBankAccountId> = findings
        .iter()
        .filter_map(|finding| match finding {
            Inconsistency::DoublePostingPattern(f) => Some(f.account_id),
            _ => None,
        })
        .collect();

    let mut halvings = Vec::new();
    let mut syncs = Vec::new();
    let mut manual_review = Vec::new();

    for finding in findings {
        match finding {
            Inconsistency::DoublePostingPattern(f) => {
                halvings.push(Correction::halve(
                    f.account_id,
                    f.account_code.clone(),
                    f.gl_account_id,
                    f.actual,
                ));
            }
            Inconsistency::GlMismatch(f) => {
                if !doubled.contains(&f.account_id) {
                    syncs.push(Correction::SyncGl {
                        cash_bank_id: f.account_id,
                        code: f.account_code.clone(),
                        gl_account_id: f.gl_account_id,
                        target_balance: f.expected,
                    });
                }
            }
            Inconsistency::TransactionMismatch(f) => {
                if !doubled.contains(&f.account_id) {
                    manual_review.push(ManualReviewItem {
                        inconsistency: finding.clone(),
                        reason: "Cached balance and transaction history disagree; \
                                 neither side is authoritative"
                            .to_string(),
                    });
                }
            }
            Inconsistency::UnbalancedJournal(_) => {
                manual_review.push(ManualReviewItem {
                    inconsistency: finding.clone(),
                    reason: "Posted journal entries are never modified automatically".to_string(),
                });
            }
        }
    }

    halvings.sort_by(|a, b| a.code().cmp(b.code()));
    syncs.sort_by(|a, b| a.code().cmp(b.code()));
    halvings.extend(syncs);

    FixPlan {
        corrections: halvings,
        manual_review,
    }
}

/// GL sync corrections for every discrepancy in a sync report.
#[must_use]
pub fn corrections_from_sync(report: &SyncReport) -> Vec<Correction> {
    report
        .discrepancies
        .iter()
        .map(|d| Correction::SyncGl {
            cash_bank_id: d.cash_bank_id,
            code: d.cash_bank_code.clone(),
            gl_account_id: d.gl_account_id,
            target_balance: d.cash_bank_balance,
        })
        .collect()
}

/// What a fix run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixSummary {
    /// Nothing was written.
    pub dry_run: bool,
    /// Corrections attempted.
    pub attempted: usize,
    /// Corrections committed.
    pub applied: usize,
    /// Findings left for an operator.
    pub manual_review: Vec<ManualReviewItem>,
    /// The corrections planned (and, unless dry run, applied).
    pub corrections: Vec<Correction>,
}

impl FixSummary {
    /// Summary of a plan that was only previewed.
    #[must_use]
    pub fn preview(plan: FixPlan) -> Self {
        Self {
            dry_run: true,
            attempted: 0,
            applied: 0,
            manual_review: plan.manual_review,
            corrections: plan.corrections,
        }
    }

    /// Summary of a plan whose corrections were all committed.
    #[must_use]
    pub fn applied(plan: FixPlan) -> Self {
        let count = plan.corrections.len();
        Self {
            dry_run: false,
            attempted: count,
            applied: count,
            manual_review: plan.manual_review,
            corrections: plan.corrections,
        }
    }
}

/// Failures of the corrective write path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixError {
    /// At least one correction failed; the whole batch was rolled back.
    #[error("{failed} of {total} corrections failed; batch rolled back")]
    BatchFailed {
        /// Corrections that failed.
        failed: usize,
        /// Corrections in the batch.
        total: usize,
        /// First failure message.
        first_error: String,
    },

    /// The locked balance no longer matches what the plan observed.
    #[error("balance of {code} changed since planning: expected {expected}, found {found}")]
    StaleBalance {
        /// Cash/bank account code.
        code: String,
        /// Balance the plan was built on.
        expected: Decimal,
        /// Balance found under the row lock.
        found: Decimal,
    },
}

impl FixError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::BatchFailed { .. } => "FIX_BATCH_FAILED",
            Self::StaleBalance { .. } => "STALE_BALANCE",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::{BalanceFinding, JournalFinding, Severity};
    use ledgerwatch_shared::types::JournalEntryId;
    use rust_decimal_macros::dec;

    fn finding(
        id: CashBankAccountId,
        code: &str,
        expected: Decimal,
        actual: Decimal,
    ) -> BalanceFinding {
        BalanceFinding {
            account_id: id,
            account_code: code.to_string(),
            account_name: format!("Account {code}"),
            gl_account_id: GlAccountId::new(),
            expected,
            actual,
            difference: actual - expected,
            severity: Severity::High,
            description: String::new(),
        }
    }

    #[test]
    fn test_gl_mismatch_syncs_to_cash_bank() {
        let id = CashBankAccountId::new();
        let plan = plan_fixes(&[Inconsistency::GlMismatch(finding(
            id,
            "CB-1",
            dec!(500),
            dec!(450),
        ))]);

        assert_eq!(plan.corrections.len(), 1);
        assert!(matches!(
            &plan.corrections[0],
            Correction::SyncGl { target_balance, .. } if *target_balance == dec!(500)
        ));
        assert!(plan.manual_review.is_empty());
    }

    #[test]
    fn test_double_posting_covers_other_findings_on_account() {
        let id = CashBankAccountId::new();
        let findings = vec![
            Inconsistency::TransactionMismatch(finding(id, "CB-2", dec!(100), dec!(200))),
            Inconsistency::GlMismatch(finding(id, "CB-2", dec!(200), dec!(100))),
            Inconsistency::DoublePostingPattern(finding(id, "CB-2", dec!(100), dec!(200))),
        ];
        let plan = plan_fixes(&findings);

        assert_eq!(plan.corrections.len(), 1);
        assert!(matches!(
            &plan.corrections[0],
            Correction::HalveDoublePosting { corrected_balance, .. } if *corrected_balance == dec!(100)
        ));
        assert!(plan.manual_review.is_empty());
    }

    #[test]
    fn test_ambiguous_findings_go_to_manual_review() {
        let findings = vec![
            Inconsistency::TransactionMismatch(finding(
                CashBankAccountId::new(),
                "CB-3",
                dec!(100),
                dec!(130),
            )),
            Inconsistency::UnbalancedJournal(JournalFinding {
                entry_id: JournalEntryId::new(),
                entry_number: "JE-0001".to_string(),
                total_debit: dec!(100),
                total_credit: dec!(90),
                difference: dec!(10),
                severity: Severity::Critical,
                description: String::new(),
            }),
        ];
        let plan = plan_fixes(&findings);

        assert!(plan.corrections.is_empty());
        assert_eq!(plan.manual_review.len(), 2);
    }

    #[test]
    fn test_halvings_come_before_syncs() {
        let findings = vec![
            Inconsistency::GlMismatch(finding(CashBankAccountId::new(), "CB-1", dec!(5), dec!(4))),
            Inconsistency::DoublePostingPattern(finding(
                CashBankAccountId::new(),
                "CB-9",
                dec!(50.005),
                dec!(100.01),
            )),
        ];
        let plan = plan_fixes(&findings);

        assert_eq!(plan.corrections[0].strategy(), "HALVE_DOUBLE_POSTING");
        assert_eq!(plan.corrections[1].strategy(), "SYNC_GL");
        assert!(matches!(
            &plan.corrections[0],
            Correction::HalveDoublePosting { corrected_balance, .. } if *corrected_balance == dec!(50.00)
        ));
    }

    #[test]
    fn test_summaries() {
        let plan = plan_fixes(&[Inconsistency::GlMismatch(finding(
            CashBankAccountId::new(),
            "CB-1",
            dec!(5),
            dec!(4),
        ))]);
        let preview = FixSummary::preview(plan.clone());
        assert!(preview.dry_run);
        assert_eq!(preview.applied, 0);
        assert_eq!(preview.corrections.len(), 1);

        let applied = FixSummary::applied(plan);
        assert!(!applied.dry_run);
        assert_eq!(applied.attempted, 1);
        assert_eq!(applied.applied, 1);
    }

    #[test]
    fn test_batch_failed_message() {
        let err = FixError::BatchFailed {
            failed: 1,
            total: 3,
            first_error: "row locked".to_string(),
        };
        assert_eq!(err.to_string(), "1 of 3 corrections failed; batch rolled back");
        assert_eq!(err.error_code(), "FIX_BATCH_FAILED");
    }
}
