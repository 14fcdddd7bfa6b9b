use crate::traits::NotificationSink;
use crate::types::{HeraldError, Outbound, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Webhook implementation of [`NotificationSink`]: POSTs the rendered body
/// as JSON. Non-2xx responses are send failures and left to the delivery
/// queue to retry.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { client, url }
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn send(&self, payload: &Outbound) -> Result<()> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(HeraldError::Send(format!(
                "webhook returned HTTP {}",
                status
            )));
        }

        debug!("Webhook accepted payload ({})", status);
        Ok(())
    }
}
