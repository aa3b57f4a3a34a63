//! `SeaORM` Entity for reconciliation_transaction_snapshots table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "reconciliation_transaction_snapshots")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub snapshot_id: Uuid,
    pub position: i32,
    pub transaction_id: Uuid,
    pub transaction_date: DateTimeWithTimeZone,
    pub reference_type: String,
    pub reference_id: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub debit_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub credit_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub balance_after: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reconciliation_snapshots::Entity",
        from = "Column::SnapshotId",
        to = "super::reconciliation_snapshots::Column::Id",
        on_delete = "Cascade"
    )]
    ReconciliationSnapshots,
}

impl Related<super::reconciliation_snapshots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReconciliationSnapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
