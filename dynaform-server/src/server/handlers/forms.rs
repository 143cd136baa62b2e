use axum::extract::{Path, Query, State};
use axum::Json;
use dynaform::database::entities::forms;
use dynaform::form_types::FormSchema;
use dynaform::services::form_service::{FormDraft, OwnerCounts};
use serde::{Deserialize, Serialize};

use crate::auth::Owner;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaQuery {
    pub form_no: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormName {
    pub form_id: i32,
    pub form_name: String,
}

pub async fn list_forms(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> ApiResult<Vec<forms::Model>> {
    Ok(Json(state.forms.list_forms_for_owner(owner_id).await?))
}

pub async fn create_form(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(draft): Json<FormDraft>,
) -> ApiResult<forms::Model> {
    Ok(Json(state.forms.create_form(owner_id, draft).await?))
}

pub async fn get_form(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<forms::Model> {
    Ok(Json(state.forms.get_form(owner_id, id).await?))
}

pub async fn update_form(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
    Json(draft): Json<FormDraft>,
) -> ApiResult<forms::Model> {
    Ok(Json(state.forms.update_form(owner_id, id, draft).await?))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<serde_json::Value> {
    state.forms.soft_delete_form(owner_id, id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Public: shown to end-users before they sign in.
pub async fn form_name(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> ApiResult<FormName> {
    let form_name = state.forms.form_name(id).await?;
    Ok(Json(FormName {
        form_id: id,
        form_name,
    }))
}

/// Public: the ordered column schema the client renders.
pub async fn form_schema(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<SchemaQuery>,
) -> ApiResult<FormSchema> {
    Ok(Json(state.assembler.schema(id, query.form_no).await?))
}

pub async fn dashboard_counts(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> ApiResult<OwnerCounts> {
    Ok(Json(state.forms.owner_counts(owner_id).await?))
}
