use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub form_id: i32,
    #[sea_orm(unique)]
    pub submission_id: String,
    pub submitter_id: i32,
    pub gateway_order_id: String,
    #[sea_orm(unique)]
    pub gateway_payment_id: String,
    pub gateway_signature: String,
    pub amount_minor: i64,
    pub currency: String,
    pub status: String,
    pub paid_at: ChronoDateTimeUtc,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forms::Entity",
        from = "Column::FormId",
        to = "super::forms::Column::Id"
    )]
    Forms,
}

impl Related<super::forms::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Forms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub const STATUS_CAPTURED: &str = "captured";
