use async_trait::async_trait;
use fulfillment_types::domain::event::NotificationEvent;
use fulfillment_types::ports::notification_publisher::{NotificationPublisher, PublishError};

/// Writes events to the log instead of a topic. Used when no topic URL is configured.
#[derive(Debug, Clone)]
pub struct LogPublisher {
    topic: String,
}

impl LogPublisher {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
        }
    }
}

impl Default for LogPublisher {
    fn default() -> Self {
        Self::new("order-events")
    }
}

#[async_trait]
impl NotificationPublisher for LogPublisher {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        let payload = serde_json::to_string(event)?;
        tracing::info!(
            topic = %self.topic,
            order_id = %event.order_id,
            status = %event.status,
            %payload,
            "event published"
        );
        Ok(())
    }
}
