use axum::extract::State;
use axum::Json;
use dynaform::database::entities::submitters;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::auth::{Owner, Submitter};
use crate::server::app::AppState;
use crate::server::error::ApiResult;

#[derive(Debug, Deserialize)]
pub struct IdentifierRequest {
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct OtpCheck {
    pub identifier: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalVerification {
    pub identifier: String,
    pub verification_ref: String,
}

#[derive(Debug, Serialize)]
pub struct Registration {
    pub submitter: submitters::Model,
    pub created: bool,
}

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<IdentifierRequest>,
) -> ApiResult<Registration> {
    let (submitter, created) = state.submitters.register(&request.identifier).await?;
    Ok(Json(Registration { submitter, created }))
}

pub async fn me(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
) -> ApiResult<submitters::Model> {
    Ok(Json(state.submitters.find(&identifier).await?))
}

pub async fn issue_otp(
    State(state): State<AppState>,
    Json(request): Json<IdentifierRequest>,
) -> ApiResult<Value> {
    state.submitters.issue_otp(&request.identifier).await?;
    Ok(Json(json!({ "sent": true })))
}

pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<OtpCheck>,
) -> ApiResult<submitters::Model> {
    Ok(Json(
        state
            .submitters
            .verify_otp(&request.identifier, &request.code)
            .await?,
    ))
}

/// Records a verification done by an external provider; owner credentials required.
pub async fn mark_verified(
    State(state): State<AppState>,
    _owner: Owner,
    Json(request): Json<ExternalVerification>,
) -> ApiResult<submitters::Model> {
    Ok(Json(
        state
            .submitters
            .mark_verified(&request.identifier, &request.verification_ref)
            .await?,
    ))
}
