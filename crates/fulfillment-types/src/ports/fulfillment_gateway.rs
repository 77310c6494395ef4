use async_trait::async_trait;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentStep {
    Payment,
    Inventory,
}

impl fmt::Display for FulfillmentStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FulfillmentStep::Payment => f.write_str("payment"),
            FulfillmentStep::Inventory => f.write_str("inventory"),
        }
    }
}

/// Every gateway failure is transient from the worker's point of view.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error("{step} call failed: {reason}")]
    Failed {
        step: FulfillmentStep,
        reason: String,
    },

    #[error("{step} call timed out")]
    Timeout { step: FulfillmentStep },
}

impl GatewayError {
    pub fn step(&self) -> FulfillmentStep {
        match self {
            GatewayError::Failed { step, .. } | GatewayError::Timeout { step } => *step,
        }
    }
}

#[async_trait]
pub trait FulfillmentGateway: Send + Sync + 'static {
    async fn authorize_payment(&self, order_id: Uuid) -> Result<(), GatewayError>;
    async fn reserve_inventory(&self, order_id: Uuid) -> Result<(), GatewayError>;
}
