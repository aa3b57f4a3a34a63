//! `SeaORM` Entity for reconciliation_differences table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{DifferenceType, SeverityLevel};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliation_differences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub reconciliation_id: Uuid,
    pub position: i32,
    pub difference_type: DifferenceType,
    pub severity: SeverityLevel,
    pub base_transaction_id: Option<Uuid>,
    pub current_transaction_id: Option<Uuid>,
    pub field: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub old_value: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub new_value: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub amount_difference: Decimal,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bank_reconciliations::Entity",
        from = "Column::ReconciliationId",
        to = "super::bank_reconciliations::Column::Id",
        on_delete = "Cascade"
    )]
    BankReconciliations,
}

impl Related<super::bank_reconciliations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BankReconciliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
