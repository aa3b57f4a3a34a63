//! `SeaORM` active enums mapped to Postgres enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Postgres `gl_account_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "gl_account_type")]
pub enum GlAccountType {
    /// Asset.
    #[sea_orm(string_value = "ASSET")]
    Asset,
    /// Liability.
    #[sea_orm(string_value = "LIABILITY")]
    Liability,
    /// Equity.
    #[sea_orm(string_value = "EQUITY")]
    Equity,
    /// Revenue.
    #[sea_orm(string_value = "REVENUE")]
    Revenue,
    /// Expense.
    #[sea_orm(string_value = "EXPENSE")]
    Expense,
}

/// Postgres `cash_bank_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "cash_bank_kind")]
pub enum CashBankKind {
    /// Petty cash.
    #[sea_orm(string_value = "CASH")]
    Cash,
    /// Bank account.
    #[sea_orm(string_value = "BANK")]
    Bank,
}

/// Postgres `journal_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "journal_status")]
pub enum JournalStatus {
    /// Not yet posted.
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    /// Posted to the ledger.
    #[sea_orm(string_value = "POSTED")]
    Posted,
    /// Reversed by a later entry.
    #[sea_orm(string_value = "REVERSED")]
    Reversed,
}

/// Postgres `snapshot_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "snapshot_status")]
pub enum SnapshotStatus {
    /// Open.
    #[sea_orm(string_value = "ACTIVE")]
    Active,
    /// Sealed.
    #[sea_orm(string_value = "LOCKED")]
    Locked,
}

/// Postgres `reconciliation_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "reconciliation_status")]
pub enum ReconciliationStatus {
    /// Awaiting review.
    #[sea_orm(string_value = "PENDING")]
    Pending,
    /// Approved.
    #[sea_orm(string_value = "APPROVED")]
    Approved,
    /// Rejected.
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

/// Postgres `difference_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "difference_type")]
pub enum DifferenceType {
    /// Only in the base snapshot.
    #[sea_orm(string_value = "MISSING")]
    Missing,
    /// Only in the comparison snapshot.
    #[sea_orm(string_value = "ADDED")]
    Added,
    /// Amount changed.
    #[sea_orm(string_value = "AMOUNT_CHANGE")]
    AmountChange,
    /// Date changed.
    #[sea_orm(string_value = "DATE_CHANGE")]
    DateChange,
}

/// Postgres `severity_level`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "severity_level")]
pub enum SeverityLevel {
    /// Low.
    #[sea_orm(string_value = "LOW")]
    Low,
    /// Medium.
    #[sea_orm(string_value = "MEDIUM")]
    Medium,
    /// High.
    #[sea_orm(string_value = "HIGH")]
    High,
    /// Critical.
    #[sea_orm(string_value = "CRITICAL")]
    Critical,
}
