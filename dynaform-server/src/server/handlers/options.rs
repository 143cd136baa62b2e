use axum::extract::{Path, Query, State};
use axum::Json;
use dynaform::database::entities::column_options;
use dynaform::form_types::OptionKind;
use dynaform::services::option_service::OptionDraft;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Owner;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionQuery {
    pub column_id: i32,
    pub form_id: i32,
    pub kind: OptionKind,
}

pub async fn add_option(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(draft): Json<OptionDraft>,
) -> ApiResult<column_options::Model> {
    Ok(Json(state.options.add_option(owner_id, draft).await?))
}

/// Public: clients load choices while rendering a form.
pub async fn list_options(
    State(state): State<AppState>,
    Query(query): Query<OptionQuery>,
) -> ApiResult<Vec<column_options::Model>> {
    Ok(Json(
        state
            .options
            .list_options(query.column_id, query.form_id, query.kind)
            .await?,
    ))
}

pub async fn delete_option(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    state.options.soft_delete_option(owner_id, id).await?;
    Ok(Json(json!({ "deleted": true })))
}
