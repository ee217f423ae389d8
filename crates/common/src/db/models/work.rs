//! Work entity
//!
//! One scholarly submission (paper, poster, keynote, session). A Work may
//! be a child of another Work representing a multi-paper session; the
//! parent chain is a tree, and cycle rejection happens at write time in
//! `Repository::set_work_parent` — the store itself does not prevent
//! cycles structurally.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Full-text storage format
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    Plain,
    Xml,
}

impl From<String> for TextFormat {
    fn from(s: String) -> Self {
        match s.as_str() {
            "xml" => TextFormat::Xml,
            _ => TextFormat::Plain,
        }
    }
}

impl From<TextFormat> for String {
    fn from(format: TextFormat) -> Self {
        match format {
            TextFormat::Plain => "plain".to_string(),
            TextFormat::Xml => "xml".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "works")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub conference_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub title: String,

    pub work_type_id: Option<Uuid>,

    #[sea_orm(column_type = "Text")]
    pub full_text: String,

    #[sea_orm(column_type = "Text")]
    pub full_text_format: String,

    pub license_id: Option<Uuid>,

    /// Parent session Work, if this Work is a session member.
    pub parent_id: Option<Uuid>,

    /// Hidden works are excluded from the resolver's preferred assertion
    /// subset; they still count when nothing visible remains.
    pub hidden: bool,

    pub created_at: DateTimeWithTimeZone,

    pub updated_at: DateTimeWithTimeZone,
}

impl Model {
    /// Get the full-text format as an enum
    pub fn text_format(&self) -> TextFormat {
        TextFormat::from(self.full_text_format.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::conference::Entity",
        from = "Column::ConferenceId",
        to = "super::conference::Column::Id"
    )]
    Conference,

    #[sea_orm(
        belongs_to = "super::work_type::Entity",
        from = "Column::WorkTypeId",
        to = "super::work_type::Column::Id"
    )]
    WorkType,

    #[sea_orm(
        belongs_to = "super::license::Entity",
        from = "Column::LicenseId",
        to = "super::license::Column::Id"
    )]
    License,

    #[sea_orm(belongs_to = "Entity", from = "Column::ParentId", to = "Column::Id")]
    Parent,

    #[sea_orm(has_many = "super::authorship::Entity")]
    Authorships,

    #[sea_orm(has_many = "super::work_keyword::Entity")]
    WorkKeywords,

    #[sea_orm(has_many = "super::work_topic::Entity")]
    WorkTopics,

    #[sea_orm(has_many = "super::work_language::Entity")]
    WorkLanguages,

    #[sea_orm(has_many = "super::work_discipline::Entity")]
    WorkDisciplines,
}

impl Related<super::conference::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Conference.def()
    }
}

impl Related<super::authorship::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Authorships.def()
    }
}

impl Related<super::work_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkType.def()
    }
}

impl Related<super::license::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::License.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
