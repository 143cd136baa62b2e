use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "validation_rules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub validation_kind_id: i32,
    pub form_id: i32,
    pub column_id: i32,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::validation_kinds::Entity",
        from = "Column::ValidationKindId",
        to = "super::validation_kinds::Column::Id"
    )]
    ValidationKinds,
}

impl Related<super::validation_kinds::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ValidationKinds.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
