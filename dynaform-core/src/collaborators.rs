//! Narrow interfaces to the outside world.
//!
//! The core only ever talks to file storage, the payment gateway and the
//! messaging service through these traits. Concrete adapters live in the
//! server crate.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;

/// Stores an uploaded file and returns a stable reference (URL or key).
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn store(
        &self,
        file_name: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, StorageError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    pub order_id: String,
    pub amount_minor: i64,
    pub currency: String,
    pub receipt: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_order(
        &self,
        amount_minor: i64,
        currency: &str,
        receipt: &str,
    ) -> anyhow::Result<GatewayOrder>;
}

#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, recipient: &str, body: &str) -> anyhow::Result<()>;
}
