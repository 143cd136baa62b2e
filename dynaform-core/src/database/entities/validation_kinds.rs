use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "validation_kinds")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::validation_rules::Entity")]
    ValidationRules,
}

impl Related<super::validation_rules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ValidationRules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
