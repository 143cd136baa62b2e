use anyhow::{Context, Result};
use async_trait::async_trait;
use dynaform::collaborators::{GatewayOrder, PaymentGateway};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.razorpay.com/v1";

/// Razorpay orders API client.
#[derive(Clone)]
pub struct RazorpayGateway {
    client: Client,
    api_base: String,
    key_id: String,
    key_secret: String,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
}

impl RazorpayGateway {
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self::with_api_base(DEFAULT_API_BASE, key_id, key_secret)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        key_id: impl Into<String>,
        key_secret: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            key_id: key_id.into(),
            key_secret: key_secret.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> Result<GatewayOrder> {
        let response = self
            .client
            .post(format!("{}/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&json!({
                "amount": amount_minor,
                "currency": currency,
                "receipt": receipt,
            }))
            .send()
            .await
            .context("order request failed")?
            .error_for_status()
            .context("gateway rejected the order")?;

        let order: OrderResponse = response
            .json()
            .await
            .context("unexpected order response")?;
        debug!("Gateway order {} created", order.id);

        Ok(GatewayOrder {
            order_id: order.id,
            amount_minor: order.amount,
            currency: order.currency,
            receipt: order.receipt.unwrap_or_else(|| receipt.to_string()),
        })
    }
}
