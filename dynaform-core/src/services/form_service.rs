use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::database::entities::{columns, form_values, forms};
use crate::errors::{SchemaError, SchemaResult};
use crate::services::ValidationService;

/// Administrator-supplied form fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    pub name: String,
    #[serde(default)]
    pub end_date: Option<DateTime<Utc>>,
    /// Fee in major currency units.
    #[serde(default)]
    pub fee: Option<Decimal>,
    #[serde(default)]
    pub banner_image: Option<String>,
    #[serde(default)]
    pub single_submission: bool,
}

/// Per-owner figures for the dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerCounts {
    pub form_count: u64,
    pub column_count: u64,
    pub submission_count: u64,
    pub submitter_count: u64,
}

#[derive(Clone)]
pub struct FormService {
    db: DatabaseConnection,
}

impl FormService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create_form(&self, owner_id: i32, draft: FormDraft) -> SchemaResult<forms::Model> {
        let name = ValidationService::validate_form_name(&draft.name)?;
        let fee_minor = ValidationService::validate_fee(draft.fee)?;

        let mut form = forms::ActiveModel::new(owner_id, name);
        form.end_date = Set(draft.end_date);
        form.fee_minor = Set(fee_minor);
        form.banner_image = Set(draft.banner_image);
        form.single_submission = Set(draft.single_submission);

        let form = form.insert(&self.db).await?;
        info!("Created form {} '{}' for owner {}", form.id, form.name, owner_id);
        Ok(form)
    }

    pub async fn get_form(&self, owner_id: i32, form_id: i32) -> SchemaResult<forms::Model> {
        forms::Entity::find_by_id(form_id)
            .filter(forms::Column::OwnerId.eq(owner_id))
            .one(&self.db)
            .await?
            .ok_or(SchemaError::FormNotFound(form_id))
    }

    pub async fn update_form(
        &self,
        owner_id: i32,
        form_id: i32,
        draft: FormDraft,
    ) -> SchemaResult<forms::Model> {
        let name = ValidationService::validate_form_name(&draft.name)?;
        let fee_minor = ValidationService::validate_fee(draft.fee)?;
        let form = self.get_form(owner_id, form_id).await?;

        let mut active: forms::ActiveModel = form.into();
        active.name = Set(name);
        active.end_date = Set(draft.end_date);
        active.fee_minor = Set(fee_minor);
        active.single_submission = Set(draft.single_submission);
        if draft.banner_image.is_some() {
            active.banner_image = Set(draft.banner_image);
        }

        let form = active.set_updated_at().update(&self.db).await?;
        info!("Updated form {}", form.id);
        Ok(form)
    }

    pub async fn soft_delete_form(&self, owner_id: i32, form_id: i32) -> SchemaResult<()> {
        let form = self.get_form(owner_id, form_id).await?;
        let mut active: forms::ActiveModel = form.into();
        active.is_active = Set(false);
        active.set_updated_at().update(&self.db).await?;
        info!("Deactivated form {}", form_id);
        Ok(())
    }

    /// All of an owner's forms. Forms past their end date are deactivated first,
    /// in the same transaction, so the listing never reports them as active.
    pub async fn list_forms_for_owner(&self, owner_id: i32) -> SchemaResult<Vec<forms::Model>> {
        let txn = self.db.begin().await?;

        let dated = forms::Entity::find()
            .filter(forms::Column::OwnerId.eq(owner_id))
            .filter(forms::Column::IsActive.eq(true))
            .filter(forms::Column::EndDate.is_not_null())
            .all(&txn)
            .await?;
        let now = Utc::now();
        let expired: Vec<i32> = dated
            .iter()
            .filter(|f| f.is_expired_at(now))
            .map(|f| f.id)
            .collect();
        deactivate_forms(&txn, &expired).await?;

        let all = forms::Entity::find()
            .filter(forms::Column::OwnerId.eq(owner_id))
            .order_by_asc(forms::Column::Id)
            .all(&txn)
            .await?;

        txn.commit().await?;
        Ok(all)
    }

    /// Public lookup of a form's display name.
    pub async fn form_name(&self, form_id: i32) -> SchemaResult<String> {
        forms::Entity::find_by_id(form_id)
            .one(&self.db)
            .await?
            .map(|f| f.name)
            .ok_or(SchemaError::FormNotFound(form_id))
    }

    /// Active, unexpired form. A form found past its end date is deactivated as part of the read.
    pub async fn find_active_form<C: ConnectionTrait>(
        conn: &C,
        form_id: i32,
    ) -> Result<Option<forms::Model>, DbErr> {
        let Some(form) = forms::Entity::find_by_id(form_id)
            .filter(forms::Column::IsActive.eq(true))
            .one(conn)
            .await?
        else {
            return Ok(None);
        };

        if form.is_expired_at(Utc::now()) {
            deactivate_forms(conn, &[form.id]).await?;
            return Ok(None);
        }
        Ok(Some(form))
    }

    pub async fn owner_counts(&self, owner_id: i32) -> SchemaResult<OwnerCounts> {
        let form_count = forms::Entity::find()
            .filter(forms::Column::OwnerId.eq(owner_id))
            .filter(forms::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        let column_count = columns::Entity::find()
            .filter(columns::Column::OwnerId.eq(owner_id))
            .filter(columns::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;

        let form_ids: Vec<i32> = forms::Entity::find()
            .select_only()
            .column(forms::Column::Id)
            .filter(forms::Column::OwnerId.eq(owner_id))
            .into_tuple()
            .all(&self.db)
            .await?;

        let submission_ids: Vec<String> = form_values::Entity::find()
            .select_only()
            .column(form_values::Column::SubmissionId)
            .distinct()
            .filter(form_values::Column::FormId.is_in(form_ids.clone()))
            .filter(form_values::Column::IsActive.eq(true))
            .into_tuple()
            .all(&self.db)
            .await?;

        let submitter_ids: Vec<i32> = form_values::Entity::find()
            .select_only()
            .column(form_values::Column::SubmitterId)
            .distinct()
            .filter(form_values::Column::FormId.is_in(form_ids))
            .filter(form_values::Column::IsActive.eq(true))
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(OwnerCounts {
            form_count,
            column_count,
            submission_count: submission_ids.len() as u64,
            submitter_count: submitter_ids.len() as u64,
        })
    }
}

async fn deactivate_forms<C: ConnectionTrait>(conn: &C, ids: &[i32]) -> Result<(), DbErr> {
    if ids.is_empty() {
        return Ok(());
    }
    forms::Entity::update_many()
        .col_expr(forms::Column::IsActive, Expr::value(false))
        .col_expr(forms::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(forms::Column::Id.is_in(ids.to_vec()))
        .exec(conn)
        .await?;
    debug!("Deactivated expired forms {:?}", ids);
    Ok(())
}
