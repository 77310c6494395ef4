#![allow(dead_code)]

use async_trait::async_trait;
use fulfillment_store::memory::InMemoryStore;
use fulfillment_types::domain::event::NotificationEvent;
use fulfillment_types::domain::message::QueueRecord;
use fulfillment_types::domain::order::{Order, OrderStatus};
use fulfillment_types::ports::fulfillment_gateway::{
    FulfillmentGateway, FulfillmentStep, GatewayError,
};
use fulfillment_types::ports::notification_publisher::{NotificationPublisher, PublishError};
use fulfillment_types::ports::status_store::{StatusStore, StoreError};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory store that records every status write and can be told to fail writes.
#[derive(Clone, Default)]
pub struct RecordingStore {
    pub inner: InMemoryStore,
    writes: Arc<Mutex<Vec<(Uuid, OrderStatus)>>>,
    /// `None` as order id rejects the status for every order.
    rejected_writes: Arc<Mutex<Vec<(Option<Uuid>, OrderStatus)>>>,
}

impl RecordingStore {
    pub fn seed(&self, customer: &str, product: &str, quantity: u32) -> Order {
        let order = Order::new(customer.into(), product.into(), quantity).unwrap();
        self.inner.insert(order.clone());
        order
    }

    pub fn fail_writes_of(&self, status: OrderStatus) {
        self.rejected_writes.lock().unwrap().push((None, status));
    }

    pub fn fail_writes_for(&self, order_id: Uuid, status: OrderStatus) {
        self.rejected_writes
            .lock()
            .unwrap()
            .push((Some(order_id), status));
    }

    pub fn rejects(&self, order_id: Uuid, status: OrderStatus) -> bool {
        self.rejected_writes
            .lock()
            .unwrap()
            .iter()
            .any(|(id, s)| *s == status && id.map_or(true, |id| id == order_id))
    }

    pub fn writes_for(&self, order_id: Uuid) -> Vec<OrderStatus> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == order_id)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn status_of(&self, order_id: Uuid) -> Option<OrderStatus> {
        self.inner.map.get(&order_id).map(|o| o.status)
    }
}

#[async_trait]
impl StatusStore for RecordingStore {
    async fn get(&self, order_id: Uuid) -> Result<Option<Order>, StoreError> {
        self.inner.get(order_id).await
    }

    async fn set_status(&self, order_id: Uuid, status: OrderStatus) -> Result<bool, StoreError> {
        if self.rejects(order_id, status) {
            return Err(StoreError::DbError(format!("write of {status} rejected")));
        }
        let updated = self.inner.set_status(order_id, status).await?;
        if updated {
            self.writes.lock().unwrap().push((order_id, status));
        }
        Ok(updated)
    }
}

/// Gateway whose answers are scripted per call; unscripted calls succeed.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    payment: Arc<Mutex<VecDeque<bool>>>,
    inventory: Arc<Mutex<VecDeque<bool>>>,
    calls: Arc<Mutex<Vec<FulfillmentStep>>>,
    panics_for: Arc<Mutex<Vec<Uuid>>>,
}

impl ScriptedGateway {
    pub fn payment_results(self, results: &[bool]) -> Self {
        self.payment.lock().unwrap().extend(results);
        self
    }

    pub fn inventory_results(self, results: &[bool]) -> Self {
        self.inventory.lock().unwrap().extend(results);
        self
    }

    /// Payment authorization panics for this order instead of answering.
    pub fn panic_for(self, order_id: Uuid) -> Self {
        self.panics_for.lock().unwrap().push(order_id);
        self
    }

    pub fn calls(&self) -> Vec<FulfillmentStep> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, step: FulfillmentStep) -> Result<(), GatewayError> {
        self.calls.lock().unwrap().push(step);
        let script = match step {
            FulfillmentStep::Payment => &self.payment,
            FulfillmentStep::Inventory => &self.inventory,
        };
        match script.lock().unwrap().pop_front() {
            Some(false) => Err(GatewayError::Failed {
                step,
                reason: "scripted failure".into(),
            }),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl FulfillmentGateway for ScriptedGateway {
    async fn authorize_payment(&self, order_id: Uuid) -> Result<(), GatewayError> {
        if self.panics_for.lock().unwrap().contains(&order_id) {
            panic!("payment provider crashed for {order_id}");
        }
        self.answer(FulfillmentStep::Payment)
    }

    async fn reserve_inventory(&self, _order_id: Uuid) -> Result<(), GatewayError> {
        self.answer(FulfillmentStep::Inventory)
    }
}

#[derive(Clone, Default)]
pub struct RecordingPublisher {
    events: Arc<Mutex<Vec<NotificationEvent>>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPublisher for RecordingPublisher {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        if self.fail {
            return Err(PublishError::Transport("topic unavailable".into()));
        }
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn created_message(message_id: &str, order_id: Uuid) -> QueueRecord {
    let inner = serde_json::json!({
        "order_id": order_id.to_string(),
        "event_type": "order_created",
        "status": "Pending",
    });
    let envelope = serde_json::json!({ "Type": "Notification", "Message": inner.to_string() });
    QueueRecord::new(message_id, envelope.to_string())
}
