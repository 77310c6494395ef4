use async_trait::async_trait;
use dashmap::DashMap;
use fulfillment_types::domain::order::{Order, OrderStatus};
use fulfillment_types::ports::status_store::{StatusStore, StoreError};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct InMemoryStore {
    pub map: Arc<DashMap<Uuid, Order>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            map: Arc::new(DashMap::new()),
        }
    }

    /// Seeds a record, as the creation endpoint would.
    pub fn insert(&self, order: Order) {
        self.map.insert(order.order_id, order);
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusStore for InMemoryStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        Ok(self.map.get(&order_id).map(|r| r.clone()))
    }

    async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        if let Some(mut v) = self.map.get_mut(&order_id) {
            v.update_status(status);
            return Ok(true);
        }
        Ok(false)
    }
}
