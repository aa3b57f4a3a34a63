//! `SeaORM` Entity for cash_bank_audit_trail table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "cash_bank_audit_trail")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub cash_bank_id: Uuid,
    pub transaction_id: Option<Uuid>,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub field_changed: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub old_value: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub new_value: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub reason: Option<String>,
    /// `None` for writes made by the system (auto-fix, monitoring).
    pub user_id: Option<Uuid>,
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
