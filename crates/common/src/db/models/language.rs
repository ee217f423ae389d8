//! Language vocabulary entity
//!
//! Import resolves language codes against this table; an unregistered
//! code is a referential error, never a silent default.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "languages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub title: String,

    /// ISO-style code matched by import, e.g. "en", "es".
    #[sea_orm(column_type = "Text", unique)]
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_language::Entity")]
    WorkLanguages,
}

impl Related<super::work_language::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkLanguages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
