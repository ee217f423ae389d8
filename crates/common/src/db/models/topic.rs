//! Topic vocabulary entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "topics")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_topic::Entity")]
    WorkTopics,
}

impl Related<super::work_topic::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkTopics.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
