use std::collections::BTreeMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::database::entities::{columns, form_details, form_values, forms};
use crate::errors::{SchemaError, SchemaResult};

/// Where a column lands inside a form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    #[serde(default)]
    pub sequence_no: Option<i32>,
    /// Section number; allocated as `max + 1` when absent.
    #[serde(default)]
    pub form_no: Option<i32>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub is_read_only: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BindingDraft {
    pub form_id: i32,
    pub column_id: i32,
    #[serde(flatten)]
    pub placement: Placement,
}

/// A bound column as shown to the form owner.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundColumn {
    pub binding_id: i32,
    pub column_id: i32,
    pub column_name: String,
    pub data_type: String,
    pub sequence_no: i32,
    pub form_no: i32,
    pub is_read_only: bool,
    pub banner_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormLayout {
    pub form_id: i32,
    pub form_name: String,
    pub columns: Vec<BoundColumn>,
}

#[derive(Clone)]
pub struct FormDetailService {
    db: DatabaseConnection,
}

impl FormDetailService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Bind an existing column into a form.
    pub async fn bind_column(
        &self,
        owner_id: i32,
        draft: BindingDraft,
    ) -> SchemaResult<form_details::Model> {
        let txn = self.db.begin().await?;

        forms::Entity::find_by_id(draft.form_id)
            .filter(forms::Column::OwnerId.eq(owner_id))
            .filter(forms::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or(SchemaError::FormNotFound(draft.form_id))?;

        let column = columns::Entity::find_by_id(draft.column_id)
            .filter(columns::Column::OwnerId.eq(owner_id))
            .filter(columns::Column::IsActive.eq(true))
            .one(&txn)
            .await?
            .ok_or(SchemaError::ColumnNotFound(draft.column_id))?;

        let binding = insert_binding(&txn, owner_id, draft.form_id, &column, draft.placement).await?;

        txn.commit().await?;
        info!(
            "Bound column {} to form {} section {}",
            binding.column_id, binding.form_id, binding.form_no
        );
        Ok(binding)
    }

    pub async fn next_form_no(&self, owner_id: i32, form_id: i32) -> SchemaResult<i32> {
        forms::Entity::find_by_id(form_id)
            .filter(forms::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::FormNotFound(form_id))?;
        Ok(next_form_no(&self.db, form_id).await?)
    }

    /// A binding on one of the owner's forms.
    pub async fn get_binding(&self, owner_id: i32, binding_id: i32) -> SchemaResult<form_details::Model> {
        form_details::Entity::find_by_id(binding_id)
            .filter(form_details::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::BindingNotFound(binding_id))
    }

    pub async fn set_sequence(
        &self,
        owner_id: i32,
        binding_id: i32,
        sequence_no: i32,
    ) -> SchemaResult<form_details::Model> {
        let binding = self.get_binding(owner_id, binding_id).await?;
        let mut active: form_details::ActiveModel = binding.into();
        active.sequence_no = Set(sequence_no);
        Ok(active.update(&self.db).await?)
    }

    pub async fn set_read_only(
        &self,
        owner_id: i32,
        binding_id: i32,
        read_only: bool,
    ) -> SchemaResult<form_details::Model> {
        let binding = self.get_binding(owner_id, binding_id).await?;
        let mut active: form_details::ActiveModel = binding.into();
        active.is_read_only = Set(read_only);
        Ok(active.update(&self.db).await?)
    }

    pub async fn soft_delete_binding(&self, owner_id: i32, binding_id: i32) -> SchemaResult<()> {
        let binding = self.get_binding(owner_id, binding_id).await?;
        let mut active: form_details::ActiveModel = binding.into();
        active.is_active = Set(false);
        active.update(&self.db).await?;
        info!("Deactivated binding {}", binding_id);
        Ok(())
    }

    /// Whether submissions already hold values for the bound column.
    pub async fn binding_in_use(&self, owner_id: i32, binding_id: i32) -> SchemaResult<bool> {
        let binding = self.get_binding(owner_id, binding_id).await?;
        let count = form_values::Entity::find()
            .filter(form_values::Column::FormId.eq(binding.form_id))
            .filter(form_values::Column::ColumnId.eq(binding.column_id))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    /// Active bindings of the owner's open forms, grouped per form.
    pub async fn list_owner_bindings(&self, owner_id: i32) -> SchemaResult<Vec<FormLayout>> {
        let now = Utc::now();
        let owned: BTreeMap<i32, forms::Model> = forms::Entity::find()
            .filter(forms::Column::OwnerId.eq(owner_id))
            .filter(forms::Column::IsActive.eq(true))
            .all(&self.db)
            .await?
            .into_iter()
            .filter(|f| !f.is_expired_at(now))
            .map(|f| (f.id, f))
            .collect();

        let rows = form_details::Entity::find()
            .filter(form_details::Column::FormId.is_in(owned.keys().copied().collect::<Vec<_>>()))
            .filter(form_details::Column::IsActive.eq(true))
            .order_by_asc(form_details::Column::FormId)
            .order_by_asc(form_details::Column::FormNo)
            .order_by_asc(form_details::Column::SequenceNo)
            .order_by_asc(form_details::Column::Id)
            .find_also_related(columns::Entity)
            .all(&self.db)
            .await?;

        let mut layouts: BTreeMap<i32, FormLayout> = BTreeMap::new();
        for (binding, column) in rows {
            let Some(column) = column.filter(|c| c.is_active) else {
                continue;
            };
            let Some(form) = owned.get(&binding.form_id) else {
                continue;
            };
            layouts
                .entry(form.id)
                .or_insert_with(|| FormLayout {
                    form_id: form.id,
                    form_name: form.name.clone(),
                    columns: Vec::new(),
                })
                .columns
                .push(BoundColumn {
                    binding_id: binding.id,
                    column_id: column.id,
                    column_name: column.name,
                    data_type: column.data_type,
                    sequence_no: binding.sequence_no,
                    form_no: binding.form_no,
                    is_read_only: binding.is_read_only,
                    banner_image: binding.banner_image,
                });
        }

        Ok(layouts.into_values().collect())
    }
}

pub(crate) async fn next_form_no<C: ConnectionTrait>(conn: &C, form_id: i32) -> Result<i32, sea_orm::DbErr> {
    let max: Option<Option<i32>> = form_details::Entity::find()
        .select_only()
        .column_as(form_details::Column::FormNo.max(), "max_form_no")
        .filter(form_details::Column::FormId.eq(form_id))
        .into_tuple()
        .one(conn)
        .await?;
    Ok(max.flatten().unwrap_or(0) + 1)
}

/// Reject `name` if another active column of the same (form, section) already uses it.
pub(crate) async fn ensure_name_free<C: ConnectionTrait>(
    conn: &C,
    form_id: i32,
    form_no: i32,
    name: &str,
    exclude_column: Option<i32>,
) -> SchemaResult<()> {
    let bound = form_details::Entity::find()
        .filter(form_details::Column::FormId.eq(form_id))
        .filter(form_details::Column::FormNo.eq(form_no))
        .filter(form_details::Column::IsActive.eq(true))
        .find_also_related(columns::Entity)
        .all(conn)
        .await?;

    let wanted = name.trim().to_lowercase();
    let clash = bound.into_iter().filter_map(|(_, c)| c).any(|c| {
        c.is_active && Some(c.id) != exclude_column && c.name.trim().to_lowercase() == wanted
    });

    if clash {
        return Err(SchemaError::DuplicateColumn {
            form_id,
            form_no,
            name: name.trim().to_string(),
        });
    }
    Ok(())
}

/// Insert a binding after the uniqueness checks. Callers own the transaction.
pub(crate) async fn insert_binding<C: ConnectionTrait>(
    conn: &C,
    owner_id: i32,
    form_id: i32,
    column: &columns::Model,
    placement: Placement,
) -> SchemaResult<form_details::Model> {
    let form_no = match placement.form_no {
        Some(n) => n,
        None => next_form_no(conn, form_id).await?,
    };

    let already_bound = form_details::Entity::find()
        .filter(form_details::Column::FormId.eq(form_id))
        .filter(form_details::Column::FormNo.eq(form_no))
        .filter(form_details::Column::ColumnId.eq(column.id))
        .filter(form_details::Column::IsActive.eq(true))
        .count(conn)
        .await?;
    if already_bound > 0 {
        return Err(SchemaError::AlreadyBound {
            column_id: column.id,
            form_id,
            form_no,
        });
    }

    ensure_name_free(conn, form_id, form_no, &column.name, Some(column.id)).await?;

    let sequence_no = match placement.sequence_no {
        Some(n) => n,
        None => {
            form_details::Entity::find()
                .filter(form_details::Column::FormId.eq(form_id))
                .filter(form_details::Column::FormNo.eq(form_no))
                .filter(form_details::Column::IsActive.eq(true))
                .count(conn)
                .await? as i32
                + 1
        }
    };

    let binding = form_details::ActiveModel {
        form_id: Set(form_id),
        column_id: Set(column.id),
        sequence_no: Set(sequence_no),
        form_no: Set(form_no),
        owner_id: Set(owner_id),
        is_active: Set(true),
        is_read_only: Set(placement.is_read_only),
        banner_image: Set(placement.banner_image),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    Ok(binding.insert(conn).await?)
}
