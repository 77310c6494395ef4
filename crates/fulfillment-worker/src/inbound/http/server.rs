use axum::{
    extract::State,
    routing::{get, post},
    serve, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::application::batch_consumer::{BatchConsumer, BatchResponse};
use crate::errors::AppError;
use fulfillment_types::domain::message::InvocationBatch;
use fulfillment_types::ports::fulfillment_gateway::FulfillmentGateway;
use fulfillment_types::ports::notification_publisher::NotificationPublisher;
use fulfillment_types::ports::status_store::StatusStore;

#[derive(Clone)]
pub struct HttpServerConfig {
    pub port: String,
}

/// Invocation boundary: the queue poller posts each batch here.
pub struct HttpServer<S, G, N> {
    pub consumer: Arc<BatchConsumer<S, G, N>>,
    pub config: HttpServerConfig,
}

impl<S, G, N> HttpServer<S, G, N>
where
    S: StatusStore,
    G: FulfillmentGateway,
    N: NotificationPublisher,
{
    pub async fn new(
        consumer: BatchConsumer<S, G, N>,
        config: HttpServerConfig,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            consumer: Arc::new(consumer),
            config,
        })
    }

    pub fn router(&self) -> Router {
        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &axum::extract::Request<_>| {
                let uri = request.uri().to_string();
                let request_id = Uuid::new_v4();
                tracing::info_span!(
                    "http_request",
                    %request_id,
                    method = %request.method(),
                    uri
                )
            })
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &tracing::Span| {
                    tracing::info!(
                        parent: span,
                        status = %response.status(),
                        latency_ms = %latency.as_millis(),
                        "response"
                    );
                },
            );

        Router::new()
            .route("/health", get(health))
            .route("/invocations", post(invoke::<S, G, N>))
            .layer(trace_layer)
            .with_state(self.consumer.clone())
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let app = self.router();
        let addr: SocketAddr = format!("0.0.0.0:{}", self.config.port).parse()?;
        tracing::info!("starting invocation server on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await?;
        serve(listener, app.into_make_service()).await?;
        Ok(())
    }
}

async fn health() -> (axum::http::StatusCode, Json<serde_json::Value>) {
    (
        axum::http::StatusCode::OK,
        Json(serde_json::json!({ "status": "ok" })),
    )
}

async fn invoke<S, G, N>(
    State(consumer): State<Arc<BatchConsumer<S, G, N>>>,
    body: String,
) -> Result<Json<BatchResponse>, AppError>
where
    S: StatusStore,
    G: FulfillmentGateway,
    N: NotificationPublisher,
{
    let batch: InvocationBatch =
        serde_json::from_str(&body).map_err(|e| AppError::BadRequest(e.to_string()))?;
    let report = consumer.handle(&batch).await;
    Ok(Json(consumer.respond(&report)))
}
