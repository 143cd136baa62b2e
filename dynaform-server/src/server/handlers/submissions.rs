use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, State};
use axum::Json;
use dynaform::services::submission_writer::{
    ExistingSubmission, FormSubmissions, LedgerEntry, SubmissionReceipt, UpdateReceipt,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::values::{raw_from_json, read_multipart};
use crate::auth::{Owner, Submitter};
use crate::server::app::AppState;
use crate::server::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct SubmissionBody {
    pub values: BTreeMap<i32, Value>,
}

pub async fn create_submission(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Path(form_id): Path<i32>,
    Json(body): Json<SubmissionBody>,
) -> ApiResult<SubmissionReceipt> {
    let raw = raw_from_json(body.values);
    Ok(Json(state.writer.create(form_id, &identifier, raw).await?))
}

pub async fn create_submission_upload(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Path(form_id): Path<i32>,
    multipart: Multipart,
) -> ApiResult<SubmissionReceipt> {
    let body = read_multipart(multipart).await?;
    Ok(Json(state.writer.create(form_id, &identifier, body.raw).await?))
}

pub async fn update_submission(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Path((form_id, submission_id)): Path<(i32, String)>,
    Json(body): Json<SubmissionBody>,
) -> ApiResult<UpdateReceipt> {
    let raw = raw_from_json(body.values);
    Ok(Json(
        state
            .writer
            .update(&submission_id, form_id, &identifier, raw)
            .await?,
    ))
}

pub async fn update_submission_upload(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Path((form_id, submission_id)): Path<(i32, String)>,
    multipart: Multipart,
) -> ApiResult<UpdateReceipt> {
    let body = read_multipart(multipart).await?;
    Ok(Json(
        state
            .writer
            .update(&submission_id, form_id, &identifier, body.raw)
            .await?,
    ))
}

pub async fn delete_submission(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Path((form_id, submission_id)): Path<(i32, String)>,
) -> ApiResult<Value> {
    let rows = state
        .writer
        .soft_delete(&submission_id, form_id, &identifier)
        .await?;
    Ok(Json(json!({ "deleted": true, "rows": rows })))
}

pub async fn check_existing(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Path(form_id): Path<i32>,
) -> ApiResult<ExistingSubmission> {
    Ok(Json(state.writer.check_existing(form_id, &identifier).await?))
}

pub async fn submitter_values(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Path(form_id): Path<i32>,
) -> ApiResult<FormSubmissions> {
    Ok(Json(
        state.writer.submitter_values(form_id, &identifier).await?,
    ))
}

pub async fn values_by_submitter(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
) -> ApiResult<Vec<FormSubmissions>> {
    Ok(Json(state.writer.values_by_submitter(&identifier).await?))
}

/// Owner view of every submission to one of their forms.
pub async fn all_values(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(form_id): Path<i32>,
) -> ApiResult<FormSubmissions> {
    state.forms.get_form(owner_id, form_id).await?;
    Ok(Json(state.writer.all_values(form_id).await?))
}

pub async fn ledger(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> ApiResult<Vec<LedgerEntry>> {
    Ok(Json(state.writer.ledger(owner_id).await?))
}
