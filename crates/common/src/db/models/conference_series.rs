//! Conference series entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conference_series")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub abbreviation: String,

    #[sea_orm(column_type = "Text")]
    pub notes: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::series_membership::Entity")]
    SeriesMemberships,
}

impl Related<super::series_membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeriesMemberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
