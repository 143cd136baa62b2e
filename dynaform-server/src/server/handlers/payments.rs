use std::collections::BTreeMap;

use axum::extract::{Multipart, State};
use axum::Json;
use dynaform::collaborators::GatewayOrder;
use dynaform::services::{PaidReceipt, PaidSubmission};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::values::{raw_from_json, read_multipart};
use crate::auth::Submitter;
use crate::server::app::AppState;
use crate::server::error::ApiResult;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub form_id: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub form_id: i32,
    pub order: GatewayOrder,
}

/// Gateway callback fields use the gateway's own snake_case names.
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub razorpay_order_id: String,
    pub razorpay_payment_id: String,
    pub razorpay_signature: String,
    #[serde(rename = "formId")]
    pub form_id: i32,
    #[serde(default)]
    pub values: BTreeMap<i32, Value>,
}

pub async fn create_order(
    State(state): State<AppState>,
    _submitter: Submitter,
    Json(request): Json<OrderRequest>,
) -> ApiResult<OrderResponse> {
    let order = state.coordinator.create_order(request.form_id).await?;
    Ok(Json(OrderResponse {
        form_id: request.form_id,
        order,
    }))
}

pub async fn verify_payment(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    Json(request): Json<VerifyRequest>,
) -> ApiResult<PaidReceipt> {
    let paid = PaidSubmission {
        form_id: request.form_id,
        identifier,
        order_id: request.razorpay_order_id,
        payment_id: request.razorpay_payment_id,
        signature: request.razorpay_signature,
        raw: raw_from_json(request.values),
    };
    Ok(Json(state.coordinator.submit_paid(paid).await?))
}

pub async fn verify_payment_upload(
    State(state): State<AppState>,
    Submitter(identifier): Submitter,
    multipart: Multipart,
) -> ApiResult<PaidReceipt> {
    let body = read_multipart(multipart).await?;
    let paid = PaidSubmission {
        form_id: body.required_i32("formId")?,
        identifier,
        order_id: body.required("razorpay_order_id")?.to_string(),
        payment_id: body.required("razorpay_payment_id")?.to_string(),
        signature: body.required("razorpay_signature")?.to_string(),
        raw: body.raw,
    };
    Ok(Json(state.coordinator.submit_paid(paid).await?))
}
