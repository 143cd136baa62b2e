use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "form_values")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub form_id: i32,
    pub column_id: i32,
    pub submission_id: String,
    pub submitter_id: i32,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forms::Entity",
        from = "Column::FormId",
        to = "super::forms::Column::Id"
    )]
    Forms,
    #[sea_orm(
        belongs_to = "super::submitters::Entity",
        from = "Column::SubmitterId",
        to = "super::submitters::Column::Id"
    )]
    Submitters,
}

impl Related<super::forms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forms.def()
    }
}

impl Related<super::submitters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Submitters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
