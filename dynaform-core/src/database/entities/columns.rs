use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::form_types::DataType;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "columns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub data_type: String,
    pub owner_id: i32,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::form_details::Entity")]
    FormDetails,
    #[sea_orm(has_many = "super::column_options::Entity")]
    ColumnOptions,
}

impl Related<super::form_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FormDetails.def()
    }
}

impl Related<super::column_options::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ColumnOptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn kind(&self) -> DataType {
        DataType::parse(&self.data_type)
    }
}
