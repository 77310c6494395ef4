use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};

/// Outcome notification published to the topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationEvent {
    pub order_id: Uuid,
    pub status: OrderStatus,
    pub customer_name: String,
    pub product_name: String,
    pub quantity: u32,
}

impl NotificationEvent {
    pub fn for_order(order: &Order, status: OrderStatus) -> Self {
        Self {
            order_id: order.order_id,
            status,
            customer_name: order.customer_name.clone(),
            product_name: order.product_name.clone(),
            quantity: order.quantity,
        }
    }
}
