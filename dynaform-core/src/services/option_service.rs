use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::entities::{column_options, columns, forms};
use crate::errors::{SchemaError, SchemaResult};
use crate::form_types::OptionKind;
use crate::services::ValidationService;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDraft {
    pub column_id: i32,
    pub form_id: i32,
    pub kind: OptionKind,
    pub label: String,
}

/// Dropdown, checkbox and radio choices, scoped to a (column, form) pair.
#[derive(Clone)]
pub struct OptionService {
    db: DatabaseConnection,
}

impl OptionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn add_option(
        &self,
        owner_id: i32,
        draft: OptionDraft,
    ) -> SchemaResult<column_options::Model> {
        let label = ValidationService::validate_option_label(&draft.label)?;

        columns::Entity::find_by_id(draft.column_id)
            .filter(columns::Column::OwnerId.eq(owner_id))
            .filter(columns::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::ColumnNotFound(draft.column_id))?;
        forms::Entity::find_by_id(draft.form_id)
            .filter(forms::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::FormNotFound(draft.form_id))?;

        let option = column_options::ActiveModel {
            column_id: Set(draft.column_id),
            form_id: Set(draft.form_id),
            option_kind: Set(draft.kind.as_str().to_string()),
            label: Set(label),
            owner_id: Set(owner_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        info!(
            "Added {} option '{}' to column {} in form {}",
            option.option_kind, option.label, option.column_id, option.form_id
        );
        Ok(option)
    }

    pub async fn list_options(
        &self,
        column_id: i32,
        form_id: i32,
        kind: OptionKind,
    ) -> SchemaResult<Vec<column_options::Model>> {
        Ok(column_options::Entity::find()
            .filter(column_options::Column::ColumnId.eq(column_id))
            .filter(column_options::Column::FormId.eq(form_id))
            .filter(column_options::Column::OptionKind.eq(kind.as_str()))
            .filter(column_options::Column::IsActive.eq(true))
            .order_by_asc(column_options::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn soft_delete_option(&self, owner_id: i32, option_id: i32) -> SchemaResult<()> {
        let option = column_options::Entity::find_by_id(option_id)
            .filter(column_options::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::OptionNotFound(option_id))?;

        let mut active: column_options::ActiveModel = option.into();
        active.is_active = Set(false);
        active.update(&self.db).await?;
        Ok(())
    }
}
