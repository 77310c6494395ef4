use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("db error: {0}")]
    DbError(String),
}

/// Durable order records keyed by `order_id`. Writes are last-write-wins.
#[async_trait]
pub trait StatusStore: Send + Sync + 'static {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Sets `status` and refreshes `updated_at`. Returns `false` when no record exists.
    /// Repeating the same status is harmless.
    async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<bool, StoreError>;
}
