use async_trait::async_trait;

use crate::domain::event::NotificationEvent;

#[derive(thiserror::Error, Debug)]
pub enum PublishError {
    #[error("publish failed: {0}")]
    Transport(String),

    #[error("event encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync + 'static {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError>;
}
