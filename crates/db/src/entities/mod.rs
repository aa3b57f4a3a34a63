//! `SeaORM` entity definitions.

pub mod bank_reconciliations;
pub mod cash_bank_accounts;
pub mod cash_bank_audit_trail;
pub mod cash_bank_transactions;
pub mod gl_accounts;
pub mod journal_entries;
pub mod journal_lines;
pub mod reconciliation_differences;
pub mod reconciliation_snapshots;
pub mod reconciliation_transaction_snapshots;
pub mod sea_orm_active_enums;
