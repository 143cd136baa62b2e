use anyhow::{Context, Result};
use async_trait::async_trait;
use dynaform::collaborators::Messenger;
use reqwest::Client;
use serde_json::json;

/// Sends text messages through a WhatsApp HTTP relay.
#[derive(Clone)]
pub struct WhatsAppMessenger {
    client: Client,
    endpoint: String,
    instance_id: String,
    access_token: String,
}

impl WhatsAppMessenger {
    pub fn new(
        endpoint: impl Into<String>,
        instance_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            instance_id: instance_id.into(),
            access_token: access_token.into(),
        }
    }
}

#[async_trait]
impl Messenger for WhatsAppMessenger {
    async fn send(&self, recipient: &str, body: &str) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(&json!({
                "number": recipient.trim_start_matches('+'),
                "type": "text",
                "message": body,
                "instance_id": self.instance_id,
                "access_token": self.access_token,
            }))
            .send()
            .await
            .context("messaging request failed")?
            .error_for_status()
            .context("messaging relay rejected the message")?;
        Ok(())
    }
}
