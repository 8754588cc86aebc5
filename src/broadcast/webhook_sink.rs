//! HTTP listener - POSTs every payload as JSON

use super::payload::BroadcastPayload;
use super::sink::BroadcastSink;
use crate::error::SinkError;
use async_trait::async_trait;
use std::time::Duration;

pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl BroadcastSink for WebhookSink {
    async fn deliver(&self, payload: &BroadcastPayload) -> Result<(), SinkError> {
        let response = self.client.post(&self.url).json(payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SinkError::Status(status.as_u16()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.url
    }
}
