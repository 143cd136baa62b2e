use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::entities::{columns, form_details, forms};
use crate::errors::{SchemaError, SchemaResult};
use crate::services::form_detail_service::{ensure_name_free, insert_binding, Placement};
use crate::services::ValidationService;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDraft {
    pub name: String,
    pub data_type: String,
}

impl ColumnDraft {
    fn validated(&self) -> SchemaResult<(String, String)> {
        Ok((
            ValidationService::validate_column_name(&self.name)?,
            ValidationService::validate_data_type(&self.data_type)?,
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundColumnRecord {
    pub column: columns::Model,
    pub binding: form_details::Model,
}

#[derive(Clone)]
pub struct ColumnService {
    db: DatabaseConnection,
}

impl ColumnService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create several columns at once; either all are stored or none.
    pub async fn create_columns(
        &self,
        owner_id: i32,
        drafts: Vec<ColumnDraft>,
    ) -> SchemaResult<Vec<columns::Model>> {
        if drafts.is_empty() {
            return Err(SchemaError::InvalidInput(
                "At least one column is required".to_string(),
            ));
        }
        let validated = drafts
            .iter()
            .map(ColumnDraft::validated)
            .collect::<SchemaResult<Vec<_>>>()?;

        let txn = self.db.begin().await?;
        let mut created = Vec::with_capacity(validated.len());
        for (name, data_type) in validated {
            let column = columns::ActiveModel {
                name: Set(name),
                data_type: Set(data_type),
                owner_id: Set(owner_id),
                is_active: Set(true),
                created_at: Set(Utc::now()),
                ..Default::default()
            };
            created.push(column.insert(&txn).await?);
        }
        txn.commit().await?;

        info!("Created {} columns for owner {}", created.len(), owner_id);
        Ok(created)
    }

    pub async fn list_columns(&self, owner_id: i32) -> SchemaResult<Vec<columns::Model>> {
        Ok(columns::Entity::find()
            .filter(columns::Column::OwnerId.eq(owner_id))
            .filter(columns::Column::IsActive.eq(true))
            .order_by_asc(columns::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn get_column(&self, owner_id: i32, column_id: i32) -> SchemaResult<columns::Model> {
        columns::Entity::find_by_id(column_id)
            .filter(columns::Column::OwnerId.eq(owner_id))
            .filter(columns::Column::IsActive.eq(true))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::ColumnNotFound(column_id))
    }

    pub async fn update_column(
        &self,
        owner_id: i32,
        column_id: i32,
        draft: ColumnDraft,
    ) -> SchemaResult<columns::Model> {
        let (name, data_type) = draft.validated()?;
        let txn = self.db.begin().await?;

        let column = columns::Entity::find_by_id(column_id)
            .filter(columns::Column::OwnerId.eq(owner_id))
            .filter(columns::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or(SchemaError::ColumnNotFound(column_id))?;
        ensure_name_free_where_bound(&txn, column_id, &name, None).await?;

        let mut active: columns::ActiveModel = column.into();
        active.name = Set(name);
        active.data_type = Set(data_type);
        let column = active.update(&txn).await?;

        txn.commit().await?;
        Ok(column)
    }

    pub async fn soft_delete_column(&self, owner_id: i32, column_id: i32) -> SchemaResult<()> {
        let column = self.get_column(owner_id, column_id).await?;
        let mut active: columns::ActiveModel = column.into();
        active.is_active = Set(false);
        active.update(&self.db).await?;
        info!("Deactivated column {}", column_id);
        Ok(())
    }

    /// Create a column and bind it into a form in one step.
    pub async fn create_bound_column(
        &self,
        owner_id: i32,
        form_id: i32,
        draft: ColumnDraft,
        placement: Placement,
    ) -> SchemaResult<BoundColumnRecord> {
        let (name, data_type) = draft.validated()?;
        let txn = self.db.begin().await?;

        forms::Entity::find_by_id(form_id)
            .filter(forms::Column::OwnerId.eq(owner_id))
            .filter(forms::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or(SchemaError::FormNotFound(form_id))?;

        let column = columns::ActiveModel {
            name: Set(name),
            data_type: Set(data_type),
            owner_id: Set(owner_id),
            is_active: Set(true),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let binding = insert_binding(&txn, owner_id, form_id, &column, placement).await?;
        txn.commit().await?;

        info!(
            "Created column {} '{}' in form {} section {}",
            column.id, column.name, form_id, binding.form_no
        );
        Ok(BoundColumnRecord { column, binding })
    }

    /// Rename/retype a bound column and move its binding, keeping names unique per section.
    pub async fn rename_bound_column(
        &self,
        owner_id: i32,
        column_id: i32,
        form_id: i32,
        draft: ColumnDraft,
        placement: Placement,
    ) -> SchemaResult<BoundColumnRecord> {
        let (name, data_type) = draft.validated()?;
        let txn = self.db.begin().await?;

        let binding = form_details::Entity::find()
            .filter(form_details::Column::FormId.eq(form_id))
            .filter(form_details::Column::ColumnId.eq(column_id))
            .filter(form_details::Column::OwnerId.eq(owner_id))
            .filter(form_details::Column::IsActive.eq(true))
            .order_by_asc(form_details::Column::Id)
            .one(&txn)
            .await?
            .ok_or(SchemaError::ColumnNotFound(column_id))?;
        let column = columns::Entity::find_by_id(column_id)
            .filter(columns::Column::OwnerId.eq(owner_id))
            .filter(columns::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or(SchemaError::ColumnNotFound(column_id))?;

        let form_no = placement.form_no.unwrap_or(binding.form_no);
        if form_no != binding.form_no {
            let already_bound = form_details::Entity::find()
                .filter(form_details::Column::FormId.eq(form_id))
                .filter(form_details::Column::FormNo.eq(form_no))
                .filter(form_details::Column::ColumnId.eq(column_id))
                .filter(form_details::Column::IsActive.eq(true))
                .filter(form_details::Column::Id.ne(binding.id))
                .count(&txn)
                .await?;
            if already_bound > 0 {
                return Err(SchemaError::AlreadyBound {
                    column_id,
                    form_id,
                    form_no,
                });
            }
        }
        ensure_name_free(&txn, form_id, form_no, &name, Some(column_id)).await?;
        ensure_name_free_where_bound(&txn, column_id, &name, Some(binding.id)).await?;

        let mut column: columns::ActiveModel = column.into();
        column.name = Set(name);
        column.data_type = Set(data_type);
        let column = column.update(&txn).await?;

        let mut binding: form_details::ActiveModel = binding.into();
        binding.form_no = Set(form_no);
        if let Some(sequence_no) = placement.sequence_no {
            binding.sequence_no = Set(sequence_no);
        }
        if placement.banner_image.is_some() {
            binding.banner_image = Set(placement.banner_image);
        }
        binding.is_read_only = Set(placement.is_read_only);
        let binding = binding.update(&txn).await?;

        txn.commit().await?;
        Ok(BoundColumnRecord { column, binding })
    }
}

/// Check `name` against every section the column is bound into, optionally
/// leaving out one binding the caller checks itself.
async fn ensure_name_free_where_bound<C: ConnectionTrait>(
    conn: &C,
    column_id: i32,
    name: &str,
    skip_binding: Option<i32>,
) -> SchemaResult<()> {
    let bindings = form_details::Entity::find()
        .filter(form_details::Column::ColumnId.eq(column_id))
        .filter(form_details::Column::IsActive.eq(true))
        .all(conn)
        .await?;
    for binding in bindings.iter().filter(|b| Some(b.id) != skip_binding) {
        ensure_name_free(conn, binding.form_id, binding.form_no, name, Some(column_id)).await?;
    }
    Ok(())
}
