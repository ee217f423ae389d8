//! Authorship / affiliation join
//!
//! The asserted affiliation set of one Authorship. Membership is a set:
//! merge operations append without duplicating.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authorship_affiliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub authorship_id: Uuid,

    pub affiliation_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::authorship::Entity",
        from = "Column::AuthorshipId",
        to = "super::authorship::Column::Id",
        on_delete = "Cascade"
    )]
    Authorship,

    #[sea_orm(
        belongs_to = "super::affiliation::Entity",
        from = "Column::AffiliationId",
        to = "super::affiliation::Column::Id"
    )]
    Affiliation,
}

impl Related<super::authorship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authorship.def()
    }
}

impl Related<super::affiliation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Affiliation.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
