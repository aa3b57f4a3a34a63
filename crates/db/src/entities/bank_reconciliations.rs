//! `SeaORM` Entity for bank_reconciliations table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ReconciliationStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "bank_reconciliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub reconciliation_number: String,
    pub cash_bank_id: Uuid,
    pub period: String,
    pub base_snapshot_id: Uuid,
    pub comparison_snapshot_id: Uuid,
    pub reconciliation_date: DateTimeWithTimeZone,
    pub reconciliation_by: Uuid,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub base_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub current_balance: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub variance: Decimal,
    pub base_transaction_count: i32,
    pub current_transaction_count: i32,
    pub transaction_variance: i32,
    pub missing_transactions: i32,
    pub added_transactions: i32,
    pub modified_transactions: i32,
    pub status: ReconciliationStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(column_type = "Text", nullable)]
    pub review_notes: Option<String>,
    pub is_balanced: bool,
    pub balance_confirmed: bool,
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
    #[sea_orm(has_many = "super::reconciliation_differences::Entity")]
    ReconciliationDifferences,
}

impl Related<super::cash_bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashBankAccounts.def()
    }
}

impl Related<super::reconciliation_differences::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationDifferences.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
