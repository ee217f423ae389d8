//! Affiliation entity
//!
//! A department string scoped to an Institution, unique as
//! (department, institution). An empty department represents the
//! institution with no sub-unit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "affiliations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub department: String,

    pub institution_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::institution::Entity",
        from = "Column::InstitutionId",
        to = "super::institution::Column::Id"
    )]
    Institution,

    #[sea_orm(has_many = "super::authorship_affiliation::Entity")]
    AuthorshipAffiliations,
}

impl Related<super::institution::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Institution.def()
    }
}

impl Related<super::authorship_affiliation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorshipAffiliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
