use chrono::Utc;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "forms")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
    pub end_date: Option<ChronoDateTimeUtc>,
    /// Fee in minor currency units; `None` or zero means the form is free.
    pub fee_minor: Option<i64>,
    pub banner_image: Option<String>,
    pub single_submission: bool,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::form_details::Entity")]
    FormDetails,
    #[sea_orm(has_many = "super::form_values::Entity")]
    FormValues,
    #[sea_orm(has_many = "super::payments::Entity")]
    Payments,
}

impl Related<super::form_details::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FormDetails.def()
    }
}

impl Related<super::form_values::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FormValues.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub fn new(owner_id: i32, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: ActiveValue::NotSet,
            name: Set(name),
            owner_id: Set(owner_id),
            end_date: Set(None),
            fee_minor: Set(None),
            banner_image: Set(None),
            single_submission: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }

    pub fn set_updated_at(mut self) -> Self {
        self.updated_at = Set(Utc::now());
        self
    }
}

impl Model {
    /// A form whose end date has passed is closed even while its active flag is still set.
    pub fn is_expired_at(&self, now: ChronoDateTimeUtc) -> bool {
        matches!(self.end_date, Some(end) if end < now)
    }

    pub fn fee(&self) -> i64 {
        self.fee_minor.unwrap_or(0).max(0)
    }

    pub fn requires_payment(&self) -> bool {
        self.fee() > 0
    }
}
