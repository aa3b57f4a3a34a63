//! `SeaORM` Entity for reconciliation_snapshots table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::SnapshotStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliation_snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cash_bank_id: Uuid,
    pub period: String,
    pub snapshot_date: DateTimeWithTimeZone,
    pub generated_by: Uuid,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub opening_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub closing_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub total_debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub total_credit: Decimal,
    pub transaction_count: i32,
    pub data_hash: String,
    pub is_locked: bool,
    pub locked_at: Option<DateTimeWithTimeZone>,
    pub locked_by: Option<Uuid>,
    pub status: SnapshotStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_bank_accounts::Entity",
        from = "Column::CashBankId",
        to = "super::cash_bank_accounts::Column::Id"
    )]
    CashBankAccounts,
    #[sea_orm(has_many = "super::reconciliation_transaction_snapshots::Entity")]
    ReconciliationTransactionSnapshots,
}

impl Related<super::cash_bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashBankAccounts.def()
    }
}

impl Related<super::reconciliation_transaction_snapshots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationTransactionSnapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
