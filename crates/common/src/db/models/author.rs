//! Author entity
//!
//! A bare identity. Every observable attribute (name, affiliation) is
//! asserted per Work through Authorships; the resolver computes the
//! current best-known values from that history. `appellations_index` is
//! a cached projection of all distinct Appellations ever asserted by the
//! author's Authorships, recomputed whenever one of them changes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "authors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Derived projection; never authoritative.
    #[sea_orm(column_type = "Text")]
    pub appellations_index: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Public identity path, the source of Redirect records on merge.
    pub fn public_path(&self) -> String {
        format!("/authors/{}", self.id)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::authorship::Entity")]
    Authorships,
}

impl Related<super::authorship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authorships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
