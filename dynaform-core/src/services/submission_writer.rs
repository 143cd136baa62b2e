use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::collaborators::AssetStore;
use crate::common::db_errors::log_db_error;
use crate::database::entities::{form_values, forms, payments, submitters};
use crate::errors::{SubmissionError, SubmissionResult};
use crate::form_types::{
    minor_to_decimal, ColumnDescriptor, FormSchema, RawSubmission, ValidatedEntry, ValidatedValue,
};
use crate::services::submission_validator::{SubmissionValidator, ValidationMode};
use crate::services::submitter_service::{find_active, get_or_create};
use crate::services::{FormService, SchemaAssembler, ValidationService};

/// Fallback label for values whose form row has gone.
pub const UNKNOWN_FORM: &str = "Unknown Form";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub submission_id: String,
    pub submitter_id: i32,
    pub value_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReceipt {
    pub submission_id: String,
    pub updated: u64,
    /// Supplied columns that had no existing row to overwrite.
    pub skipped: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExistingSubmission {
    pub has_submission: bool,
    pub submission_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub submission_id: String,
    pub submitter: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub values: BTreeMap<i32, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmissions {
    pub form_id: i32,
    pub form_name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub submissions: Vec<SubmissionView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub order_id: String,
    pub payment_id: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub paid_at: DateTime<Utc>,
}

/// One submission with its payment, if it went through the paid path.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub submission_id: String,
    pub form_id: i32,
    pub form_name: String,
    pub submitter: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub payment: Option<PaymentSummary>,
}

#[derive(Clone)]
pub struct SubmissionWriter {
    db: DatabaseConnection,
    assets: Arc<dyn AssetStore>,
}

impl SubmissionWriter {
    pub fn new(db: DatabaseConnection, assets: Arc<dyn AssetStore>) -> Self {
        Self { db, assets }
    }

    /// Store a new submission for a free form.
    pub async fn create(
        &self,
        form_id: i32,
        identifier: &str,
        raw: RawSubmission,
    ) -> SubmissionResult<SubmissionReceipt> {
        let identifier = ValidationService::validate_identifier(identifier)?;
        let form = FormService::find_active_form(&self.db, form_id)
            .await?
            .ok_or(SubmissionError::FormNotFound(form_id))?;
        if form.requires_payment() {
            return Err(SubmissionError::PaymentRequired {
                form_id,
                fee: minor_to_decimal(form.fee()),
            });
        }
        let schema = SchemaAssembler::load(&self.db, form_id, None)
            .await?
            .ok_or(SubmissionError::FormNotFound(form_id))?;

        let entries = SubmissionValidator::validate(&schema, &raw, ValidationMode::Complete).await?;
        if entries.is_empty() {
            return Err(SubmissionError::EmptySubmission);
        }

        if form.single_submission {
            if let Some(submitter) = find_active(&self.db, &identifier).await? {
                ensure_no_submission(&self.db, form_id, submitter.id).await?;
            }
        }

        let values = resolve_files(self.assets.as_ref(), entries).await?;

        let txn = self.db.begin().await?;
        let (submitter, _) = get_or_create(&txn, &identifier).await?;
        if form.single_submission {
            ensure_no_submission(&txn, form_id, submitter.id).await?;
        }
        let submission_id = new_submission_id();
        let value_count = persist_values(&txn, form_id, submitter.id, &submission_id, &values).await?;
        txn.commit().await?;

        info!(
            "Stored submission {} for form {} ({} values)",
            submission_id, form_id, value_count
        );
        Ok(SubmissionReceipt {
            submission_id,
            submitter_id: submitter.id,
            value_count,
        })
    }

    /// Overwrite values of an existing submission. Never adds rows.
    pub async fn update(
        &self,
        submission_id: &str,
        form_id: i32,
        identifier: &str,
        raw: RawSubmission,
    ) -> SubmissionResult<UpdateReceipt> {
        let submitter = find_active(&self.db, identifier)
            .await?
            .ok_or_else(|| SubmissionError::SubmitterNotFound(identifier.to_string()))?;
        let mut schema = SchemaAssembler::load(&self.db, form_id, None)
            .await?
            .ok_or(SubmissionError::FormNotFound(form_id))?;
        // read-only values are ignored on update, whatever they contain
        schema.columns.retain(|c| !c.read_only);

        let existing = form_values::Entity::find()
            .filter(form_values::Column::FormId.eq(form_id))
            .filter(form_values::Column::SubmissionId.eq(submission_id))
            .filter(form_values::Column::SubmitterId.eq(submitter.id))
            .filter(form_values::Column::IsActive.eq(true))
            .count(&self.db)
            .await?;
        if existing == 0 {
            return Err(SubmissionError::SubmissionNotFound(submission_id.to_string()));
        }

        let entries = SubmissionValidator::validate(&schema, &raw, ValidationMode::Partial).await?;
        let values = resolve_files(self.assets.as_ref(), entries).await?;

        let txn = self.db.begin().await?;
        let mut updated = 0;
        for (col_id, value) in &values {
            let result = form_values::Entity::update_many()
                .col_expr(form_values::Column::Value, Expr::value(value.clone()))
                .col_expr(form_values::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(form_values::Column::FormId.eq(form_id))
                .filter(form_values::Column::ColumnId.eq(*col_id))
                .filter(form_values::Column::SubmissionId.eq(submission_id))
                .filter(form_values::Column::SubmitterId.eq(submitter.id))
                .filter(form_values::Column::IsActive.eq(true))
                .exec(&txn)
                .await?;
            updated += result.rows_affected;
        }
        txn.commit().await?;

        let skipped = values.len() as u64 - updated;
        if skipped > 0 {
            warn!(
                "Update of submission {} skipped {} columns with no stored value",
                submission_id, skipped
            );
        }
        Ok(UpdateReceipt {
            submission_id: submission_id.to_string(),
            updated,
            skipped,
        })
    }

    /// Whether the submitter already has an active submission to this form.
    pub async fn check_existing(
        &self,
        form_id: i32,
        identifier: &str,
    ) -> SubmissionResult<ExistingSubmission> {
        let Some(submitter) = find_active(&self.db, identifier).await? else {
            return Ok(ExistingSubmission {
                has_submission: false,
                submission_id: None,
            });
        };
        let latest = latest_submission(&self.db, form_id, submitter.id).await?;
        Ok(ExistingSubmission {
            has_submission: latest.is_some(),
            submission_id: latest,
        })
    }

    /// A submitter's own submissions to one form.
    pub async fn submitter_values(
        &self,
        form_id: i32,
        identifier: &str,
    ) -> SubmissionResult<FormSubmissions> {
        let submitter = find_active(&self.db, identifier)
            .await?
            .ok_or_else(|| SubmissionError::SubmitterNotFound(identifier.to_string()))?;
        let rows = form_values::Entity::find()
            .filter(form_values::Column::FormId.eq(form_id))
            .filter(form_values::Column::SubmitterId.eq(submitter.id))
            .filter(form_values::Column::IsActive.eq(true))
            .order_by_asc(form_values::Column::Id)
            .all(&self.db)
            .await?;
        let names = HashMap::from([(submitter.id, submitter.identifier)]);
        self.group_form(form_id, rows, &names).await
    }

    /// Every active submission to a form, regardless of submitter.
    pub async fn all_values(&self, form_id: i32) -> SubmissionResult<FormSubmissions> {
        let rows = form_values::Entity::find()
            .filter(form_values::Column::FormId.eq(form_id))
            .filter(form_values::Column::IsActive.eq(true))
            .order_by_asc(form_values::Column::Id)
            .all(&self.db)
            .await?;
        let names = submitter_names(&self.db, &rows).await?;
        self.group_form(form_id, rows, &names).await
    }

    /// All of a submitter's submissions, grouped per form.
    pub async fn values_by_submitter(&self, identifier: &str) -> SubmissionResult<Vec<FormSubmissions>> {
        let submitter = find_active(&self.db, identifier)
            .await?
            .ok_or_else(|| SubmissionError::SubmitterNotFound(identifier.to_string()))?;
        let rows = form_values::Entity::find()
            .filter(form_values::Column::SubmitterId.eq(submitter.id))
            .filter(form_values::Column::IsActive.eq(true))
            .order_by_asc(form_values::Column::FormId)
            .order_by_asc(form_values::Column::Id)
            .all(&self.db)
            .await?;

        let names = HashMap::from([(submitter.id, submitter.identifier)]);
        let mut per_form: BTreeMap<i32, Vec<form_values::Model>> = BTreeMap::new();
        for row in rows {
            per_form.entry(row.form_id).or_default().push(row);
        }
        let mut grouped = Vec::with_capacity(per_form.len());
        for (form_id, rows) in per_form {
            grouped.push(self.group_form(form_id, rows, &names).await?);
        }
        Ok(grouped)
    }

    pub async fn soft_delete(
        &self,
        submission_id: &str,
        form_id: i32,
        identifier: &str,
    ) -> SubmissionResult<u64> {
        let submitter = find_active(&self.db, identifier)
            .await?
            .ok_or_else(|| SubmissionError::SubmitterNotFound(identifier.to_string()))?;
        let result = form_values::Entity::update_many()
            .col_expr(form_values::Column::IsActive, Expr::value(false))
            .col_expr(form_values::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(form_values::Column::FormId.eq(form_id))
            .filter(form_values::Column::SubmissionId.eq(submission_id))
            .filter(form_values::Column::SubmitterId.eq(submitter.id))
            .filter(form_values::Column::IsActive.eq(true))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(SubmissionError::SubmissionNotFound(submission_id.to_string()));
        }
        info!("Deactivated submission {}", submission_id);
        Ok(result.rows_affected)
    }

    /// Submissions to the owner's forms with their payments, newest first.
    pub async fn ledger(&self, owner_id: i32) -> SubmissionResult<Vec<LedgerEntry>> {
        let owned: HashMap<i32, String> = forms::Entity::find()
            .filter(forms::Column::OwnerId.eq(owner_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|f| (f.id, f.name))
            .collect();

        let rows = form_values::Entity::find()
            .filter(form_values::Column::FormId.is_in(owned.keys().copied().collect::<Vec<_>>()))
            .filter(form_values::Column::IsActive.eq(true))
            .order_by_desc(form_values::Column::CreatedAt)
            .order_by_desc(form_values::Column::Id)
            .all(&self.db)
            .await?;
        let names = submitter_names(&self.db, &rows).await?;

        let mut seen = HashSet::new();
        let mut entries: Vec<LedgerEntry> = Vec::new();
        for row in rows {
            if !seen.insert(row.submission_id.clone()) {
                continue;
            }
            entries.push(LedgerEntry {
                form_name: owned
                    .get(&row.form_id)
                    .cloned()
                    .unwrap_or_else(|| UNKNOWN_FORM.to_string()),
                submitter: names.get(&row.submitter_id).cloned(),
                submission_id: row.submission_id,
                form_id: row.form_id,
                submitted_at: row.created_at,
                payment: None,
            });
        }

        let paid: HashMap<String, payments::Model> = payments::Entity::find()
            .filter(
                payments::Column::SubmissionId
                    .is_in(entries.iter().map(|e| e.submission_id.clone()).collect::<Vec<_>>()),
            )
            .filter(payments::Column::IsActive.eq(true))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|p| (p.submission_id.clone(), p))
            .collect();
        for entry in &mut entries {
            entry.payment = paid.get(&entry.submission_id).map(|p| PaymentSummary {
                order_id: p.gateway_order_id.clone(),
                payment_id: p.gateway_payment_id.clone(),
                amount: minor_to_decimal(p.amount_minor),
                currency: p.currency.clone(),
                status: p.status.clone(),
                paid_at: p.paid_at,
            });
        }

        Ok(entries)
    }

    async fn group_form(
        &self,
        form_id: i32,
        rows: Vec<form_values::Model>,
        names: &HashMap<i32, String>,
    ) -> SubmissionResult<FormSubmissions> {
        let schema = SchemaAssembler::load_any(&self.db, form_id).await?;
        let (form_name, columns) = match schema {
            Some(FormSchema {
                form_name, columns, ..
            }) => (form_name, columns),
            None => (UNKNOWN_FORM.to_string(), Vec::new()),
        };

        let mut order: Vec<String> = Vec::new();
        let mut by_id: HashMap<String, SubmissionView> = HashMap::new();
        for row in rows {
            let view = by_id.entry(row.submission_id.clone()).or_insert_with(|| {
                order.push(row.submission_id.clone());
                SubmissionView {
                    submission_id: row.submission_id.clone(),
                    submitter: names.get(&row.submitter_id).cloned(),
                    submitted_at: row.created_at,
                    values: BTreeMap::new(),
                }
            });
            view.values.insert(row.column_id, row.value);
        }

        Ok(FormSubmissions {
            form_id,
            form_name,
            columns,
            submissions: order
                .into_iter()
                .filter_map(|id| by_id.remove(&id))
                .collect(),
        })
    }
}

pub fn new_submission_id() -> String {
    Uuid::new_v4().to_string()
}

/// Swap file payloads for storage references. Callers run this before opening their
/// transaction; stored assets are not removed if that transaction later rolls back.
pub async fn resolve_files(
    assets: &dyn AssetStore,
    entries: Vec<ValidatedEntry>,
) -> SubmissionResult<Vec<(i32, String)>> {
    let mut values = Vec::with_capacity(entries.len());
    for entry in entries {
        let value = match entry.value {
            ValidatedValue::Text(text) => text,
            ValidatedValue::File(file) => {
                assets
                    .store(&file.file_name, file.content_type.as_deref(), &file.bytes)
                    .await?
            }
        };
        values.push((entry.col_id, value));
    }
    Ok(values)
}

/// One active row per value, all sharing `submission_id`.
pub(crate) async fn persist_values<C: ConnectionTrait>(
    conn: &C,
    form_id: i32,
    submitter_id: i32,
    submission_id: &str,
    values: &[(i32, String)],
) -> Result<usize, DbErr> {
    let now = Utc::now();
    for (col_id, value) in values {
        form_values::ActiveModel {
            form_id: Set(form_id),
            column_id: Set(*col_id),
            submission_id: Set(submission_id.to_string()),
            submitter_id: Set(submitter_id),
            value: Set(value.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(conn)
        .await
        .map_err(|e| log_db_error("insert submission value", e))?;
    }
    Ok(values.len())
}

async fn latest_submission<C: ConnectionTrait>(
    conn: &C,
    form_id: i32,
    submitter_id: i32,
) -> Result<Option<String>, DbErr> {
    Ok(form_values::Entity::find()
        .filter(form_values::Column::FormId.eq(form_id))
        .filter(form_values::Column::SubmitterId.eq(submitter_id))
        .filter(form_values::Column::IsActive.eq(true))
        .order_by_desc(form_values::Column::Id)
        .one(conn)
        .await?
        .map(|row| row.submission_id))
}

pub(crate) async fn ensure_no_submission<C: ConnectionTrait>(
    conn: &C,
    form_id: i32,
    submitter_id: i32,
) -> SubmissionResult<()> {
    match latest_submission(conn, form_id, submitter_id).await? {
        Some(submission_id) => Err(SubmissionError::DuplicateSubmission {
            form_id,
            submission_id,
        }),
        None => Ok(()),
    }
}

async fn submitter_names<C: ConnectionTrait>(
    conn: &C,
    rows: &[form_values::Model],
) -> Result<HashMap<i32, String>, DbErr> {
    let mut ids: Vec<i32> = rows.iter().map(|r| r.submitter_id).collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(submitters::Entity::find()
        .filter(submitters::Column::Id.is_in(ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|s| (s.id, s.identifier))
        .collect())
}
