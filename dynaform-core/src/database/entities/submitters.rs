use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "submitters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Email address or phone number.
    #[sea_orm(unique)]
    pub identifier: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub verification_ref: Option<String>,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::form_values::Entity")]
    FormValues,
}

impl Related<super::form_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FormValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
