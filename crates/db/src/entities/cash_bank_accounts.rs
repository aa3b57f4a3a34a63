//! `SeaORM` Entity for cash_bank_accounts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::CashBankKind;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_bank_accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub name: String,
    pub kind: CashBankKind,
    pub currency: String,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub balance: Decimal,
    #[sea_orm(unique)]
    pub gl_account_id: Uuid,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::gl_accounts::Entity",
        from = "Column::GlAccountId",
        to = "super::gl_accounts::Column::Id"
    )]
    GlAccounts,
    #[sea_orm(has_many = "super::cash_bank_transactions::Entity")]
    CashBankTransactions,
    #[sea_orm(has_many = "super::reconciliation_snapshots::Entity")]
    ReconciliationSnapshots,
}

impl Related<super::gl_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GlAccounts.def()
    }
}

impl Related<super::cash_bank_transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashBankTransactions.def()
    }
}

impl Related<super::reconciliation_snapshots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationSnapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
