use axum::extract::{Path, State};
use axum::Json;
use dynaform::database::entities::columns;
use dynaform::services::column_service::{BoundColumnRecord, ColumnDraft};
use dynaform::services::form_detail_service::Placement;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Owner;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

/// A column definition together with where it goes in the form.
#[derive(Debug, Deserialize)]
pub struct BoundColumnRequest {
    #[serde(flatten)]
    pub column: ColumnDraft,
    #[serde(flatten)]
    pub placement: Placement,
}

pub async fn list_columns(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
) -> ApiResult<Vec<columns::Model>> {
    Ok(Json(state.columns.list_columns(owner_id).await?))
}

pub async fn create_columns(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(drafts): Json<Vec<ColumnDraft>>,
) -> ApiResult<Vec<columns::Model>> {
    Ok(Json(state.columns.create_columns(owner_id, drafts).await?))
}

pub async fn update_column(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
    Json(draft): Json<ColumnDraft>,
) -> ApiResult<columns::Model> {
    Ok(Json(state.columns.update_column(owner_id, id, draft).await?))
}

pub async fn delete_column(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    state.columns.soft_delete_column(owner_id, id).await?;
    Ok(Json(json!({ "deleted": true })))
}

pub async fn create_bound_column(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(form_id): Path<i32>,
    Json(request): Json<BoundColumnRequest>,
) -> ApiResult<BoundColumnRecord> {
    Ok(Json(
        state
            .columns
            .create_bound_column(owner_id, form_id, request.column, request.placement)
            .await?,
    ))
}

pub async fn rename_bound_column(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path((form_id, column_id)): Path<(i32, i32)>,
    Json(request): Json<BoundColumnRequest>,
) -> ApiResult<BoundColumnRecord> {
    Ok(Json(
        state
            .columns
            .rename_bound_column(owner_id, column_id, form_id, request.column, request.placement)
            .await?,
    ))
}
