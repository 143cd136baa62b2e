use axum::extract::{Path, State};
use axum::Json;
use dynaform::database::entities::form_details;
use dynaform::services::form_detail_service::{BindingDraft, FormLayout};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Owner;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceRequest {
    pub sequence_no: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOnlyRequest {
    pub is_read_only: bool,
}

pub async fn list_bindings(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> ApiResult<Vec<FormLayout>> {
    Ok(Json(state.details.list_owner_bindings(owner_id).await?))
}

pub async fn bind_column(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(draft): Json<BindingDraft>,
) -> ApiResult<form_details::Model> {
    Ok(Json(state.details.bind_column(owner_id, draft).await?))
}

pub async fn next_form_no(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(form_id): Path<i32>,
) -> ApiResult<Value> {
    let next = state.details.next_form_no(owner_id, form_id).await?;
    Ok(Json(json!({ "formId": form_id, "nextFormNo": next })))
}

pub async fn set_sequence(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
    Json(request): Json<SequenceRequest>,
) -> ApiResult<form_details::Model> {
    Ok(Json(state.details.set_sequence(owner_id, id, request.sequence_no).await?))
}

pub async fn set_read_only(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
    Json(request): Json<ReadOnlyRequest>,
) -> ApiResult<form_details::Model> {
    Ok(Json(state.details.set_read_only(owner_id, id, request.is_read_only).await?))
}

pub async fn delete_binding(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    state.details.soft_delete_binding(owner_id, id).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn binding_in_use(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    let in_use = state.details.binding_in_use(owner_id, id).await?;
    Ok(Json(json!({ "bindingId": id, "inUse": in_use })))
}
