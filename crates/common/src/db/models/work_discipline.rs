//! Work / discipline join

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "work_disciplines")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub work_id: Uuid,

    pub discipline_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::work::Entity",
        from = "Column::WorkId",
        to = "super::work::Column::Id",
        on_delete = "Cascade"
    )]
    Work,

    #[sea_orm(
        belongs_to = "super::discipline::Entity",
        from = "Column::DisciplineId",
        to = "super::discipline::Column::Id"
    )]
    Discipline,
}

impl Related<super::work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Work.def()
    }
}

impl Related<super::discipline::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Discipline.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
