//! Appellation entity
//!
//! A (first name, last name) pair as asserted in one submission context —
//! "a name as asserted", not "a person". Unique as a pair (index created
//! in schema bootstrap).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "appellations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    #[sea_orm(column_type = "Text")]
    pub first_name: String,

    #[sea_orm(column_type = "Text")]
    pub last_name: String,
}

impl Model {
    /// Display form used in provenance messages and the author index.
    pub fn display_name(&self) -> String {
        if self.first_name.is_empty() {
            self.last_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        let appellation = Model {
            id: Uuid::new_v4(),
            first_name: "Maria Jose".into(),
            last_name: "X".into(),
        };
        assert_eq!(appellation.display_name(), "Maria Jose X");

        let mononym = Model {
            id: Uuid::new_v4(),
            first_name: "".into(),
            last_name: "Voltaire".into(),
        };
        assert_eq!(mononym.display_name(), "Voltaire");
    }
}
