use axum::extract::{Path, State};
use axum::Json;
use dynaform::database::entities::{validation_kinds, validation_rules};
use dynaform::services::validation_rule_service::{RuleDraft, RuleView};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Owner;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleUpdate {
    pub validation_kind_id: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

pub async fn list_kinds(State(state): State<AppState>) -> ApiResult<Vec<validation_kinds::Model>> {
    Ok(Json(state.rules.list_kinds().await?))
}

pub async fn add_rule(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Json(draft): Json<RuleDraft>,
) -> ApiResult<validation_rules::Model> {
    Ok(Json(state.rules.add_rule(owner_id, draft).await?))
}

pub async fn get_rule(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<validation_rules::Model> {
    Ok(Json(state.rules.get_rule(owner_id, id).await?))
}

pub async fn rules_for_form(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(form_id): Path<i32>,
) -> ApiResult<Vec<RuleView>> {
    Ok(Json(state.rules.rules_for_form(owner_id, form_id).await?))
}

pub async fn update_rule(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
    Json(update): Json<RuleUpdate>,
) -> ApiResult<validation_rules::Model> {
    Ok(Json(
        state
            .rules
            .update_rule(owner_id, id, update.validation_kind_id, update.is_active)
            .await?,
    ))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Owner(owner_id): Owner,
    Path(id): Path<i32>,
) -> ApiResult<Value> {
    state.rules.soft_delete_rule(owner_id, id).await?;
    Ok(Json(json!({ "deleted": true })))
}
