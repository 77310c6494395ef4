use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use fulfillment_types::ports::fulfillment_gateway::{
    FulfillmentGateway, FulfillmentStep, GatewayError,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod publisher;

pub use publisher::WebhookPublisher;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct FulfillmentClientBuilder {
    base: Url,
    headers: HeaderMap,
    timeout: Option<Duration>,
    client: Option<reqwest::Client>,
}

/// HTTP adapter for the payment and inventory upstreams.
#[derive(Clone)]
pub struct FulfillmentClient {
    base: Url,
    client: reqwest::Client,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentRequest {
    pub order_id: Uuid,
}

impl FulfillmentClient {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        Self::builder(base_url)?.build()
    }

    pub fn builder(base_url: &str) -> anyhow::Result<FulfillmentClientBuilder> {
        let mut base = Url::parse(base_url).context("invalid base url")?;
        // Keep any path prefix when joining endpoint paths.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(FulfillmentClientBuilder {
            base,
            headers: HeaderMap::new(),
            timeout: None,
            client: None,
        })
    }

    fn url(&self, path: &str) -> anyhow::Result<Url> {
        self.base.join(path).context("failed to join url")
    }

    async fn call(
        &self,
        step: FulfillmentStep,
        path: &str,
        order_id: Uuid,
    ) -> Result<(), GatewayError> {
        let failed = |reason: String| GatewayError::Failed { step, reason };
        let url = self.url(path).map_err(|e| failed(format!("{e:#}")))?;

        tracing::debug!(%order_id, %step, %url, "calling fulfillment upstream");
        let res = self
            .client
            .post(url)
            .json(&FulfillmentRequest { order_id })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout { step }
                } else {
                    failed(e.to_string())
                }
            })?;

        let status = res.status();
        if !status.is_success() {
            tracing::warn!(%order_id, %step, %status, "fulfillment upstream refused");
            return Err(failed(format!("upstream returned {status}")));
        }
        Ok(())
    }
}

#[async_trait]
impl FulfillmentGateway for FulfillmentClient {
    async fn authorize_payment(&self, order_id: Uuid) -> Result<(), GatewayError> {
        self.call(FulfillmentStep::Payment, "payments/authorize", order_id)
            .await
    }

    async fn reserve_inventory(&self, order_id: Uuid) -> Result<(), GatewayError> {
        self.call(FulfillmentStep::Inventory, "inventory/reserve", order_id)
            .await
    }
}

impl FulfillmentClientBuilder {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_header(
        mut self,
        key: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> anyhow::Result<Self> {
        let header_name =
            HeaderName::from_bytes(key.as_ref().as_bytes()).context("invalid header name")?;
        let header_value = HeaderValue::from_str(value.as_ref()).context("invalid header value")?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> anyhow::Result<FulfillmentClient> {
        if let Some(client) = self.client {
            return Ok(FulfillmentClient {
                base: self.base,
                client,
            });
        }

        let mut builder = reqwest::Client::builder().timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT));
        if !self.headers.is_empty() {
            builder = builder.default_headers(self.headers);
        }
        let client = builder.build()?;
        Ok(FulfillmentClient {
            base: self.base,
            client,
        })
    }
}
