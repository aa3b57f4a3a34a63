//! `SeaORM` Entity for cash_bank_transactions table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_bank_transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cash_bank_id: Uuid,
    pub reference_type: String,
    pub reference_id: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub balance_after: Decimal,
    pub transaction_date: DateTimeWithTimeZone,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cash_bank_accounts::Entity",
        from = "Column::CashBankId",
        to = "super::cash_bank_accounts::Column::Id"
    )]
    CashBankAccounts,
}

impl Related<super::cash_bank_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashBankAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
