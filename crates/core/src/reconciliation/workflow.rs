//! Reconciliation review workflow.

use uuid::Uuid;

use super::error::ReconciliationError;
use super::period::Period;
use super::types::ReconciliationStatus;

/// Stateless review transitions.
///
/// Only PENDING reconciliations can be reviewed; APPROVED and REJECTED are
/// terminal.
pub struct ReconciliationWorkflow;

impl ReconciliationWorkflow {
    /// PENDING → APPROVED.
    pub fn approve(
        current: ReconciliationStatus,
    ) -> Result<ReconciliationStatus, ReconciliationError> {
        Self::ensure_pending(current)?;
        Ok(ReconciliationStatus::Approved)
    }

    /// PENDING → REJECTED. The reason must not be blank.
    pub fn reject(
        current: ReconciliationStatus,
        reason: &str,
    ) -> Result<ReconciliationStatus, ReconciliationError> {
        if reason.trim().is_empty() {
            return Err(ReconciliationError::RejectionReasonRequired);
        }
        Self::ensure_pending(current)?;
        Ok(ReconciliationStatus::Rejected)
    }

    fn ensure_pending(current: ReconciliationStatus) -> Result<(), ReconciliationError> {
        if current == ReconciliationStatus::Pending {
            Ok(())
        } else {
            Err(ReconciliationError::NotPending { current })
        }
    }
}

/// Human-readable number `REC-YYYYMM-XXXXXXXX`.
///
/// The suffix is the last eight hex digits of the id, which are random in
/// a v7 UUID.
#[must_use]
pub fn reconciliation_number(period: Period, id: Uuid) -> String {
    let hex = id.simple().to_string().to_uppercase();
    let suffix = &hex[hex.len() - 8..];
    format!("REC-{}-{suffix}", period.compact())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approve_pending() {
        assert_eq!(
            ReconciliationWorkflow::approve(ReconciliationStatus::Pending).unwrap(),
            ReconciliationStatus::Approved
        );
    }

    #[test]
    fn test_terminal_states_cannot_be_reviewed() {
        for status in [ReconciliationStatus::Approved, ReconciliationStatus::Rejected] {
            assert!(matches!(
                ReconciliationWorkflow::approve(status),
                Err(ReconciliationError::NotPending { current }) if current == status
            ));
            assert!(ReconciliationWorkflow::reject(status, "late").is_err());
        }
    }

    #[test]
    fn test_reject_requires_reason() {
        assert!(matches!(
            ReconciliationWorkflow::reject(ReconciliationStatus::Pending, "   "),
            Err(ReconciliationError::RejectionReasonRequired)
        ));
        assert_eq!(
            ReconciliationWorkflow::reject(ReconciliationStatus::Pending, "bank statement disagrees")
                .unwrap(),
            ReconciliationStatus::Rejected
        );
    }

    #[test]
    fn test_reconciliation_number_format() {
        let id = Uuid::parse_str("0190f3a2-7b4c-7d11-9e2f-a1b2c3d4e5f6").unwrap();
        let number = reconciliation_number(Period::parse("2024-07").unwrap(), id);
        assert_eq!(number, "REC-202407-C3D4E5F6");
    }
}
