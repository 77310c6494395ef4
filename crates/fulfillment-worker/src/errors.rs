use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use fulfillment_types::ports::fulfillment_gateway::GatewayError;
use fulfillment_types::ports::status_store::StoreError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Why a single processing attempt did not complete an order.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("order {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Fulfillment(#[from] GatewayError),

    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl ProcessError {
    /// `NotFound` will not heal on its own; everything else may.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ProcessError::NotFound(_))
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
        };

        let body = serde_json::to_string(&ErrorBody { error: msg })
            .unwrap_or_else(|_| "{\"error\":\"internal serialization\"}".into());
        (code, [("content-type", "application/json")], body).into_response()
    }
}
