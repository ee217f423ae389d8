//! Keyword vocabulary entity
//!
//! One of the five controlled vocabularies (Keyword, Topic, Language,
//! Discipline, WorkType). Each vocabulary is its own table and its own
//! entity type; a merge across kinds is unrepresentable.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "keywords")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_keyword::Entity")]
    WorkKeywords,
}

impl Related<super::work_keyword::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkKeywords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
