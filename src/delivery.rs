use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;

use crate::error::{Result, RouterError};

/// Single-attempt JSON webhook poster.
#[derive(Debug, Clone)]
pub struct WebhookClient {
    client: Client,
}

impl WebhookClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self { client })
    }

    /// POSTs `payload` as JSON. Any status of 299 or above, and any transport
    /// failure, is reported as `DeliveryFailed`.
    pub async fn post_json<T: Serialize + ?Sized>(&self, url: &str, payload: &T) -> Result<StatusCode> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| RouterError::DeliveryFailed(format!("request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.as_u16() >= 299 {
            if let Ok(body) = serde_json::to_string(payload) {
                log::debug!("Rejected payload: {}", body);
            }
            return Err(RouterError::DeliveryFailed(format!("endpoint responded {}", status)));
        }

        log::debug!("Webhook accepted with status {}", status);
        Ok(status)
    }
}
