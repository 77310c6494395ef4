use async_trait::async_trait;
use fulfillment_client::{FulfillmentClient, WebhookPublisher};
use fulfillment_types::domain::event::NotificationEvent;
use fulfillment_types::ports::fulfillment_gateway::{FulfillmentGateway, GatewayError};
use fulfillment_types::ports::notification_publisher::{NotificationPublisher, PublishError};
use fulfillment_worker::config::Config;
use fulfillment_worker::outbound::log_publisher::LogPublisher;
use fulfillment_worker::outbound::simulated_gateway::SimulatedGateway;
use uuid::Uuid;

/// Gateway chosen at startup: the real upstream when `GATEWAY_URL` is set.
pub enum Gateway {
    Http(FulfillmentClient),
    Simulated(SimulatedGateway),
}

impl Gateway {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.gateway_url.as_deref() {
            Some(url) => {
                tracing::info!(url, "using http fulfillment gateway");
                let client = FulfillmentClient::builder(url)?
                    .with_timeout(config.gateway_timeout())
                    .build()?;
                Ok(Self::Http(client))
            }
            None => {
                tracing::warn!(
                    failure_rate = config.simulated_failure_rate,
                    "GATEWAY_URL not set, using simulated fulfillment gateway"
                );
                Ok(Self::Simulated(SimulatedGateway::new(
                    config.simulated_failure_rate,
                    config.simulated_latency(),
                )))
            }
        }
    }
}

#[async_trait]
impl FulfillmentGateway for Gateway {
    async fn authorize_payment(&self, order_id: Uuid) -> Result<(), GatewayError> {
        match self {
            Gateway::Http(g) => g.authorize_payment(order_id).await,
            Gateway::Simulated(g) => g.authorize_payment(order_id).await,
        }
    }

    async fn reserve_inventory(&self, order_id: Uuid) -> Result<(), GatewayError> {
        match self {
            Gateway::Http(g) => g.reserve_inventory(order_id).await,
            Gateway::Simulated(g) => g.reserve_inventory(order_id).await,
        }
    }
}

/// Publisher chosen at startup: the topic webhook when `NOTIFY_URL` is set.
pub enum Publisher {
    Webhook(WebhookPublisher),
    Log(LogPublisher),
}

impl Publisher {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        match config.notify_url.as_deref() {
            Some(url) => Ok(Self::Webhook(WebhookPublisher::new(
                url,
                config.gateway_timeout(),
            )?)),
            None => Ok(Self::Log(LogPublisher::default())),
        }
    }
}

#[async_trait]
impl NotificationPublisher for Publisher {
    async fn publish(&self, event: &NotificationEvent) -> Result<(), PublishError> {
        match self {
            Publisher::Webhook(p) => p.publish(event).await,
            Publisher::Log(p) => p.publish(event).await,
        }
    }
}
