//! Import provenance message entity
//!
//! One row per create-or-reuse decision during an import attempt. The
//! audit trail an editor reviews to catch false-positive institution
//! matches.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Provenance kind: was the entity newly created or matched to an
/// existing row?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProvenanceKind {
    Created,
    Matched,
}

impl From<String> for ProvenanceKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "created" => ProvenanceKind::Created,
            _ => ProvenanceKind::Matched,
        }
    }
}

impl From<ProvenanceKind> for String {
    fn from(kind: ProvenanceKind) -> Self {
        match kind {
            ProvenanceKind::Created => "created".to_string(),
            ProvenanceKind::Matched => "matched".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "import_messages")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub attempt_id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub kind: String,

    #[sea_orm(column_type = "Text")]
    pub message: String,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    pub fn provenance_kind(&self) -> ProvenanceKind {
        ProvenanceKind::from(self.kind.clone())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::import_attempt::Entity",
        from = "Column::AttemptId",
        to = "super::import_attempt::Column::Id",
        on_delete = "Cascade"
    )]
    Attempt,
}

impl Related<super::import_attempt::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attempt.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
