//! Discipline vocabulary entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "disciplines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_discipline::Entity")]
    WorkDisciplines,
}

impl Related<super::work_discipline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkDisciplines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
