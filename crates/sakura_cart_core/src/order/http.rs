//! Blocking HTTP transport for the order webhook.

use super::forwarder::{TransportError, WebhookReply, WebhookTransport};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Duration;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// `reqwest`-backed webhook transport.
pub struct ReqwestWebhookTransport {
    client: Client,
}

impl ReqwestWebhookTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .map_err(|err| TransportError(err.to_string()))?;
        Ok(Self { client })
    }
}

impl WebhookTransport for ReqwestWebhookTransport {
    fn post_json(&self, url: &str, payload: &Value) -> Result<WebhookReply, TransportError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .map_err(|err| TransportError(err.to_string()))?;

        let status = response.status();
        Ok(WebhookReply {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
        })
    }
}
