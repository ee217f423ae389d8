//! Organizer entity

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "organizers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text", unique)]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub abbreviation: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::conference_organizer::Entity")]
    ConferenceOrganizers,
}

impl Related<super::conference_organizer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ConferenceOrganizers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
