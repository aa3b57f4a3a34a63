//! `SeaORM` Entity for journal_lines table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "journal_lines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub journal_entry_id: Uuid,
    pub gl_account_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub debit: Decimal,
    #[sea_orm(column_type = "Decimal(Some((20, 2)))")]
    pub credit: Decimal,
    #[sea_orm(column_type = "Text", nullable)]
    pub memo: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::journal_entries::Entity",
        from = "Column::JournalEntryId",
        to = "super::journal_entries::Column::Id"
    )]
    JournalEntries,
    #[sea_orm(
        belongs_to = "super::gl_accounts::Entity",
        from = "Column::GlAccountId",
        to = "super::gl_accounts::Column::Id"
    )]
    GlAccounts,
}

impl Related<super::journal_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::JournalEntries.def()
    }
}

impl Related<super::gl_accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GlAccounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
