mod adapters;

use adapters::{Gateway, Publisher};
use fulfillment_store::{build_store, Store};
use fulfillment_worker::application::batch_consumer::BatchConsumer;
use fulfillment_worker::application::order_processor::OrderProcessor;
use fulfillment_worker::config::Config;
use fulfillment_worker::inbound::http::{HttpServer, HttpServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env for DATABASE_URL / GATEWAY_URL / ... when present.
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .init();

    let config = Config::from_env()?;
    let store: Store = build_store(config.database_url.as_deref()).await?;
    tracing::info!(store = store.kind(), "status store ready");

    let processor = OrderProcessor::new(
        store,
        Gateway::from_config(&config)?,
        Publisher::from_config(&config)?,
    );
    let consumer = BatchConsumer::new(
        processor,
        config.retry_policy(),
        config.consumer_options(),
    );

    let server_cfg = HttpServerConfig {
        port: config.server_port.clone(),
    };

    let http = HttpServer::new(consumer, server_cfg).await?;
    http.run().await
}
