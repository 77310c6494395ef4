use async_trait::async_trait;
use fulfillment_types::ports::fulfillment_gateway::{
    FulfillmentGateway, FulfillmentStep, GatewayError,
};
use rand::Rng;
use std::time::Duration;
use uuid::Uuid;

/// Stand-in for the payment and inventory upstreams: each call waits `latency` and then
/// fails with probability `failure_rate`.
#[derive(Debug, Clone)]
pub struct SimulatedGateway {
    failure_rate: f64,
    latency: Duration,
}

impl SimulatedGateway {
    pub fn new(failure_rate: f64, latency: Duration) -> Self {
        Self {
            failure_rate: failure_rate.clamp(0.0, 1.0),
            latency,
        }
    }

    pub fn reliable() -> Self {
        Self::new(0.0, Duration::ZERO)
    }

    pub fn failing() -> Self {
        Self::new(1.0, Duration::ZERO)
    }

    async fn call(&self, step: FulfillmentStep, order_id: Uuid) -> Result<(), GatewayError> {
        tracing::info!(%order_id, %step, "simulating upstream call");
        tokio::time::sleep(self.latency).await;
        let failed = rand::thread_rng().gen_bool(self.failure_rate);
        if failed {
            tracing::error!(%order_id, %step, "upstream call failed");
            return Err(GatewayError::Failed {
                step,
                reason: "simulated upstream failure".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FulfillmentGateway for SimulatedGateway {
    async fn authorize_payment(&self, order_id: Uuid) -> Result<(), GatewayError> {
        self.call(FulfillmentStep::Payment, order_id).await
    }

    async fn reserve_inventory(&self, order_id: Uuid) -> Result<(), GatewayError> {
        self.call(FulfillmentStep::Inventory, order_id).await
    }
}
