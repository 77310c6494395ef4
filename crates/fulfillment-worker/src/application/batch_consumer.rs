use std::sync::Arc;

use fulfillment_types::domain::event::NotificationEvent;
use fulfillment_types::domain::message::{InvocationBatch, QueueRecord};
use fulfillment_types::domain::order::OrderStatus;
use fulfillment_types::ports::fulfillment_gateway::FulfillmentGateway;
use fulfillment_types::ports::notification_publisher::NotificationPublisher;
use fulfillment_types::ports::status_store::StatusStore;
use serde::{Deserialize, Serialize};
use tracing::Instrument;
use uuid::Uuid;

use crate::application::in_flight::InFlight;
use crate::application::order_processor::{AttemptOutcome, OrderProcessor};
use crate::application::retry::{RetryController, RetryPolicy, RetryReport};
use crate::errors::ProcessError;

pub const BATCH_ACK_BODY: &str = "Processing complete";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConsumerOptions {
    /// List exhausted orders in `batchItemFailures` so the queue redelivers them.
    pub partial_batch_response: bool,
    /// Publish a `Failed` notification once an order's retries are exhausted.
    pub publish_failure_events: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Completed {
        message_id: String,
        order_id: Uuid,
        attempts: u32,
    },
    AlreadyCompleted {
        message_id: String,
        order_id: Uuid,
    },
    Failed {
        message_id: String,
        order_id: Uuid,
        attempts: u32,
        reason: String,
    },
    NotFound {
        message_id: String,
        order_id: Uuid,
    },
    Skipped {
        message_id: String,
        reason: String,
    },
    Duplicate {
        message_id: String,
        order_id: Uuid,
    },
    Panicked {
        message_id: String,
        order_id: Uuid,
    },
}

impl MessageOutcome {
    pub fn message_id(&self) -> &str {
        match self {
            MessageOutcome::Completed { message_id, .. }
            | MessageOutcome::AlreadyCompleted { message_id, .. }
            | MessageOutcome::Failed { message_id, .. }
            | MessageOutcome::NotFound { message_id, .. }
            | MessageOutcome::Skipped { message_id, .. }
            | MessageOutcome::Duplicate { message_id, .. }
            | MessageOutcome::Panicked { message_id, .. } => message_id,
        }
    }

    /// Redelivery can only help orders that ran out of attempts or crashed mid-way.
    pub fn needs_redelivery(&self) -> bool {
        matches!(
            self,
            MessageOutcome::Failed { .. } | MessageOutcome::Panicked { .. }
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub outcomes: Vec<MessageOutcome>,
}

impl BatchReport {
    pub fn completed(&self) -> usize {
        self.count(|o| {
            matches!(
                o,
                MessageOutcome::Completed { .. } | MessageOutcome::AlreadyCompleted { .. }
            )
        })
    }

    pub fn failed(&self) -> usize {
        self.count(MessageOutcome::needs_redelivery)
    }

    pub fn ignored(&self) -> usize {
        self.outcomes.len() - self.completed() - self.failed()
    }

    fn count(&self, pred: impl Fn(&MessageOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|&o| pred(o)).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchItemFailure {
    #[serde(rename = "itemIdentifier")]
    pub item_identifier: String,
}

/// What the invocation boundary sees. Always a success acknowledgment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: String,
    #[serde(rename = "batchItemFailures", default)]
    pub batch_item_failures: Vec<BatchItemFailure>,
}

pub struct BatchConsumer<S, G, N> {
    processor: Arc<OrderProcessor<S, G, N>>,
    retry: Arc<RetryController>,
    in_flight: InFlight,
    options: ConsumerOptions,
}

impl<S, G, N> BatchConsumer<S, G, N>
where
    S: StatusStore,
    G: FulfillmentGateway,
    N: NotificationPublisher,
{
    pub fn new(
        processor: OrderProcessor<S, G, N>,
        policy: RetryPolicy,
        options: ConsumerOptions,
    ) -> Self {
        Self {
            processor: Arc::new(processor),
            retry: Arc::new(RetryController::new(policy)),
            in_flight: InFlight::new(),
            options,
        }
    }

    pub fn processor(&self) -> &OrderProcessor<S, G, N> {
        &self.processor
    }

    pub fn in_flight(&self) -> &InFlight {
        &self.in_flight
    }

    /// Handles every record in order. No record can abort the ones after it.
    pub async fn handle(&self, batch: &InvocationBatch) -> BatchReport {
        tracing::info!(records = batch.records.len(), "processing batch");
        let mut report = BatchReport::default();
        for record in &batch.records {
            let outcome = self.handle_record(record).await;
            report.outcomes.push(outcome);
        }
        tracing::info!(
            completed = report.completed(),
            failed = report.failed(),
            ignored = report.ignored(),
            "batch handled"
        );
        report
    }

    pub fn respond(&self, report: &BatchReport) -> BatchResponse {
        let batch_item_failures = if self.options.partial_batch_response {
            report
                .outcomes
                .iter()
                .filter(|o| o.needs_redelivery())
                .map(|o| BatchItemFailure {
                    item_identifier: o.message_id().to_string(),
                })
                .collect()
        } else {
            Vec::new()
        };
        BatchResponse {
            status_code: 200,
            body: BATCH_ACK_BODY.to_string(),
            batch_item_failures,
        }
    }

    async fn handle_record(&self, record: &QueueRecord) -> MessageOutcome {
        let message_id = record.message_id.clone();
        let message = match record.order_message() {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(%message_id, error = %e, "skipping message");
                return MessageOutcome::Skipped {
                    message_id,
                    reason: e.to_string(),
                };
            }
        };
        let order_id = message.order_id;
        tracing::info!(
            %message_id,
            %order_id,
            event_type = message.event_type.as_deref().unwrap_or("-"),
            "processing order"
        );

        let Some(token) = self.in_flight.try_claim(order_id) else {
            tracing::warn!(%message_id, %order_id, "order already in flight, skipping duplicate");
            return MessageOutcome::Duplicate {
                message_id,
                order_id,
            };
        };

        let processor = self.processor.clone();
        let retry = self.retry.clone();
        let span = tracing::info_span!("order", %order_id, %message_id);
        // Awaited right away: records stay sequential, but a panic is confined to the task.
        let task = tokio::spawn(
            async move {
                let _token = token;
                retry
                    .run(order_id, |_| processor.process(order_id))
                    .await
            }
            .instrument(span),
        );

        match task.await {
            Ok(report) => self.settle(message_id, order_id, report).await,
            Err(e) => {
                tracing::error!(%order_id, error = %e, "order processing aborted");
                MessageOutcome::Panicked {
                    message_id,
                    order_id,
                }
            }
        }
    }

    async fn settle(
        &self,
        message_id: String,
        order_id: Uuid,
        report: RetryReport<AttemptOutcome>,
    ) -> MessageOutcome {
        match report.outcome {
            Ok(AttemptOutcome::Completed) => MessageOutcome::Completed {
                message_id,
                order_id,
                attempts: report.attempts,
            },
            Ok(AttemptOutcome::AlreadyCompleted) => MessageOutcome::AlreadyCompleted {
                message_id,
                order_id,
            },
            Err(ProcessError::NotFound(_)) => MessageOutcome::NotFound {
                message_id,
                order_id,
            },
            Err(e) => {
                if self.options.publish_failure_events {
                    self.publish_failure(order_id).await;
                }
                MessageOutcome::Failed {
                    message_id,
                    order_id,
                    attempts: report.attempts,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn publish_failure(&self, order_id: Uuid) {
        let order = match self.processor.store().get(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(%order_id, error = %e, "cannot load order for failure event");
                return;
            }
        };
        let event = NotificationEvent::for_order(&order, OrderStatus::Failed);
        if let Err(e) = self.processor.publisher().publish(&event).await {
            tracing::warn!(%order_id, error = %e, "failure event not published");
        }
    }
}
