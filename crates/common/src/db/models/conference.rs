//! Conference entity
//!
//! A dated/located event owning Works. `search_text` is a derived
//! projection recomputed on every save from the conference's own fields
//! plus related series, organizer, and host institution names — see
//! `Repository::save_conference`. It reflects those entities as of the
//! last save, not a live join.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "conferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub short_title: String,

    #[sea_orm(column_type = "Text")]
    pub theme_title: String,

    /// Conference year; the timestamp of every attribute assertion made
    /// by this conference's authorships.
    pub year: i32,

    pub start_date: Option<Date>,

    pub end_date: Option<Date>,

    #[sea_orm(column_type = "Text")]
    pub city: String,

    #[sea_orm(column_type = "Text")]
    pub notes: String,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    /// Derived search projection; never authoritative.
    #[sea_orm(column_type = "Text")]
    pub search_text: String,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work::Entity")]
    Works,

    #[sea_orm(has_many = "super::series_membership::Entity")]
    SeriesMemberships,

    #[sea_orm(has_many = "super::conference_organizer::Entity")]
    ConferenceOrganizers,

    #[sea_orm(has_many = "super::conference_host::Entity")]
    ConferenceHosts,

    #[sea_orm(has_many = "super::import_attempt::Entity")]
    ImportAttempts,
}

impl Related<super::work::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Works.def()
    }
}

impl Related<super::series_membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SeriesMemberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
