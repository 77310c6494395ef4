use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A batch of queue records delivered to one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationBatch {
    #[serde(rename = "Records", default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueRecord {
    #[serde(rename = "messageId", default)]
    pub message_id: String,
    /// Kept raw so a missing or non-string body fails only its own record.
    #[serde(default)]
    pub body: Value,
}

/// The order reference carried by a queue record once unwrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderMessage {
    pub order_id: Uuid,
    pub event_type: Option<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum MessageError {
    #[error("invalid message body: {0}")]
    InvalidBody(String),

    #[error("no order_id found in message")]
    MissingOrderId,

    #[error("invalid order_id {0:?}")]
    InvalidOrderId(String),
}

impl QueueRecord {
    pub fn new(message_id: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            body: Value::String(body.into()),
        }
    }

    /// Unwraps the body into an order reference. Bodies relayed from a topic carry the
    /// order message as a JSON string under `Message`; direct sends carry it inline.
    pub fn order_message(&self) -> Result<OrderMessage, MessageError> {
        let raw = match &self.body {
            Value::String(raw) => raw,
            Value::Null => return Err(MessageError::InvalidBody("missing body".into())),
            _ => return Err(MessageError::InvalidBody("body is not a string".into())),
        };
        let body: Value =
            serde_json::from_str(raw).map_err(|e| MessageError::InvalidBody(e.to_string()))?;

        let message = match body.get("Message") {
            Some(Value::String(inner)) => serde_json::from_str::<Value>(inner)
                .map_err(|e| MessageError::InvalidBody(e.to_string()))?,
            _ => body,
        };
        if !message.is_object() {
            return Err(MessageError::InvalidBody("expected a JSON object".into()));
        }

        let raw_id = match message.get("order_id") {
            Some(Value::String(s)) if !s.is_empty() => s.as_str(),
            _ => return Err(MessageError::MissingOrderId),
        };
        let order_id =
            Uuid::parse_str(raw_id).map_err(|_| MessageError::InvalidOrderId(raw_id.to_string()))?;
        let event_type = message
            .get("event_type")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(OrderMessage {
            order_id,
            event_type,
        })
    }
}
