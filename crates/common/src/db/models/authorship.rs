//! Authorship entity
//!
//! The join of Work, Author, one Appellation, and an affiliation set,
//! carrying a 1-based order unique per Work. This is the single source
//! of temporal assertion: each Authorship is implicitly dated by its
//! Work's conference year. (author, work) is unique — an author cannot
//! hold two authorships on one Work.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authorships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub work_id: Uuid,

    pub author_id: Uuid,

    pub appellation_id: Uuid,

    /// 1-based position within the Work's author list.
    pub authorship_order: i32,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
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
        belongs_to = "super::author::Entity",
        from = "Column::AuthorId",
        to = "super::author::Column::Id"
    )]
    Author,

    #[sea_orm(
        belongs_to = "super::appellation::Entity",
        from = "Column::AppellationId",
        to = "super::appellation::Column::Id"
    )]
    Appellation,

    #[sea_orm(has_many = "super::authorship_affiliation::Entity")]
    AuthorshipAffiliations,
}

impl Related<super::work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Work.def()
    }
}

impl Related<super::author::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::appellation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appellation.def()
    }
}

impl Related<super::authorship_affiliation::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthorshipAffiliations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
