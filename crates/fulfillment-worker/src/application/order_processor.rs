use crate::errors::ProcessError;
use fulfillment_types::domain::event::NotificationEvent;
use fulfillment_types::domain::order::OrderStatus;
use fulfillment_types::ports::fulfillment_gateway::{FulfillmentGateway, GatewayError};
use fulfillment_types::ports::notification_publisher::NotificationPublisher;
use fulfillment_types::ports::status_store::StatusStore;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Completed,
    /// A redelivered message for an order that already finished.
    AlreadyCompleted,
}

/// Drives one order through a single fulfillment attempt.
pub struct OrderProcessor<S, G, N> {
    store: S,
    gateway: G,
    publisher: N,
}

impl<S, G, N> OrderProcessor<S, G, N>
where
    S: StatusStore,
    G: FulfillmentGateway,
    N: NotificationPublisher,
{
    pub fn new(store: S, gateway: G, publisher: N) -> Self {
        Self {
            store,
            gateway,
            publisher,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publisher(&self) -> &N {
        &self.publisher
    }

    /// One attempt: `Processing`, payment, inventory, then `Completed` plus a completion
    /// event. Once `Processing` is persisted, any failure leaves the order `Failed`.
    pub async fn process(&self, order_id: Uuid) -> Result<AttemptOutcome, ProcessError> {
        tracing::info!(%order_id, "fetching order");
        let order = match self.store.get(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::error!(%order_id, "order not found");
                return Err(ProcessError::NotFound(order_id));
            }
            Err(e) => {
                tracing::error!(%order_id, error = %e, "error fetching order");
                return Err(e.into());
            }
        };

        if !order.status.can_transition_to(OrderStatus::Processing) {
            tracing::info!(%order_id, status = %order.status, "order already completed, skipping");
            return Ok(AttemptOutcome::AlreadyCompleted);
        }

        self.write_status(order_id, OrderStatus::Processing).await?;

        if let Err(e) = self.fulfill(order_id).await {
            tracing::error!(%order_id, error = %e, "processing failed");
            self.mark_failed(order_id).await;
            return Err(e.into());
        }

        if let Err(e) = self.write_status(order_id, OrderStatus::Completed).await {
            self.mark_failed(order_id).await;
            return Err(e);
        }

        let event = NotificationEvent::for_order(&order, OrderStatus::Completed);
        match self.publisher.publish(&event).await {
            Ok(()) => tracing::info!(%order_id, "published completion event"),
            // Status is already Completed; re-running would repeat the charge.
            Err(e) => tracing::warn!(%order_id, error = %e, "completion event not published"),
        }

        Ok(AttemptOutcome::Completed)
    }

    async fn fulfill(&self, order_id: Uuid) -> Result<(), GatewayError> {
        self.gateway.authorize_payment(order_id).await?;
        tracing::info!(%order_id, "payment authorized");
        self.gateway.reserve_inventory(order_id).await?;
        tracing::info!(%order_id, "inventory reserved");
        Ok(())
    }

    async fn write_status(&self, order_id: Uuid, status: OrderStatus) -> Result<(), ProcessError> {
        tracing::info!(%order_id, %status, "updating order status");
        match self.store.set_status(order_id, status).await {
            Ok(true) => Ok(()),
            Ok(false) => {
                tracing::error!(%order_id, %status, "order vanished before status write");
                Err(ProcessError::NotFound(order_id))
            }
            Err(e) => {
                tracing::error!(%order_id, %status, error = %e, "error updating order status");
                Err(e.into())
            }
        }
    }

    /// Best effort. Never surfaces its own error over the original failure.
    async fn mark_failed(&self, order_id: Uuid) {
        match self.store.set_status(order_id, OrderStatus::Failed).await {
            Ok(true) => tracing::info!(%order_id, "order marked Failed"),
            Ok(false) => tracing::warn!(%order_id, "order vanished before it could be marked Failed"),
            Err(e) => {
                tracing::error!(%order_id, error = %e, "error updating order status to Failed")
            }
        }
    }
}
