use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use fulfillment_types::domain::event::NotificationEvent;
use fulfillment_types::ports::notification_publisher::{NotificationPublisher, PublishError};
use reqwest::Url;

/// Posts notification events as JSON to a topic endpoint.
#[derive(Clone)]
pub struct WebhookPublisher {
    topic_url: Url,
    client: reqwest::Client,
}

impl WebhookPublisher {
    pub fn new(topic_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let topic_url = Url::parse(topic_url).context("invalid topic url")?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { topic_url, client })
    }
}

#[async_trait]
impl NotificationPublisher for WebhookPublisher {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        self.client
            .post(self.topic_url.clone())
            .json(event)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| PublishError::Transport(e.to_string()))?;
        tracing::debug!(order_id = %event.order_id, status = %event.status, "event posted");
        Ok(())
    }
}
