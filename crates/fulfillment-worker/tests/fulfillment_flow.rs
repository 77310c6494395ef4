mod support;

use fulfillment_types::domain::message::{InvocationBatch, QueueRecord};
use fulfillment_types::domain::order::OrderStatus;
use fulfillment_types::ports::fulfillment_gateway::FulfillmentStep;
use fulfillment_worker::application::batch_consumer::{
    BatchConsumer, ConsumerOptions, MessageOutcome,
};
use fulfillment_worker::application::order_processor::OrderProcessor;
use fulfillment_worker::application::retry::{RetryController, RetryPolicy};
use fulfillment_worker::errors::ProcessError;
use std::time::Duration;
use support::{created_message, RecordingPublisher, RecordingStore, ScriptedGateway};
use uuid::Uuid;

fn policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(2))
}

fn consumer(
    store: &RecordingStore,
    gateway: &ScriptedGateway,
    publisher: &RecordingPublisher,
    options: ConsumerOptions,
) -> BatchConsumer<RecordingStore, ScriptedGateway, RecordingPublisher> {
    BatchConsumer::new(
        OrderProcessor::new(store.clone(), gateway.clone(), publisher.clone()),
        policy(),
        options,
    )
}

fn allowed_path(writes: &[OrderStatus]) -> bool {
    let mut current = OrderStatus::Pending;
    writes.iter().all(|next| {
        let ok = current.can_transition_to(*next);
        current = *next;
        ok
    })
}

#[tokio::test]
async fn completes_on_first_attempt() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default();
    let publisher = RecordingPublisher::default();
    let o1 = store.seed("Alice", "Widget", 2);
    let consumer = consumer(&store, &gateway, &publisher, Default::default());

    let report = consumer
        .handle(&InvocationBatch {
            records: vec![created_message("m-1", o1.order_id)],
        })
        .await;
    let response = consumer.respond(&report);

    assert_eq!(response.status_code, 200);
    assert_eq!(store.status_of(o1.order_id), Some(OrderStatus::Completed));
    assert_eq!(
        store.writes_for(o1.order_id),
        vec![OrderStatus::Processing, OrderStatus::Completed]
    );
    assert_eq!(
        gateway.calls(),
        vec![FulfillmentStep::Payment, FulfillmentStep::Inventory]
    );

    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].order_id, o1.order_id);
    assert_eq!(events[0].status, OrderStatus::Completed);
    assert_eq!(events[0].customer_name, "Alice");
    assert_eq!(events[0].product_name, "Widget");
    assert_eq!(events[0].quantity, 2);
}

#[tokio::test]
async fn payment_recovers_on_third_attempt() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default().payment_results(&[false, false, true]);
    let publisher = RecordingPublisher::default();
    let o2 = store.seed("Bob", "Gadget", 1);
    let processor = OrderProcessor::new(store.clone(), gateway.clone(), publisher.clone());

    let report = RetryController::new(policy())
        .run(o2.order_id, |_| processor.process(o2.order_id))
        .await;

    assert!(report.is_success());
    assert_eq!(report.attempts, 3);
    assert_eq!(report.waits.len(), 2);
    assert!(report.waits[0] > report.waits[1]);

    let writes = store.writes_for(o2.order_id);
    assert_eq!(
        writes,
        vec![
            OrderStatus::Processing,
            OrderStatus::Failed,
            OrderStatus::Processing,
            OrderStatus::Failed,
            OrderStatus::Processing,
            OrderStatus::Completed,
        ]
    );
    assert_eq!(
        writes.iter().filter(|s| **s == OrderStatus::Failed).count(),
        2
    );
    assert!(allowed_path(&writes));
    assert_eq!(store.status_of(o2.order_id), Some(OrderStatus::Completed));
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn exhausted_retries_leave_order_failed() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default().inventory_results(&[false, false, false]);
    let publisher = RecordingPublisher::default();
    let o3 = store.seed("Cara", "Lamp", 4);
    let consumer = consumer(&store, &gateway, &publisher, Default::default());

    let report = consumer
        .handle(&InvocationBatch {
            records: vec![created_message("m-3", o3.order_id)],
        })
        .await;
    let response = consumer.respond(&report);

    assert_eq!(response.status_code, 200);
    assert!(response.batch_item_failures.is_empty());
    assert!(matches!(
        report.outcomes[0],
        MessageOutcome::Failed { attempts: 3, .. }
    ));
    assert_eq!(store.status_of(o3.order_id), Some(OrderStatus::Failed));
    assert!(allowed_path(&store.writes_for(o3.order_id)));
    assert!(publisher.events().is_empty());
    // Inventory is only reached after payment succeeds, once per attempt.
    assert_eq!(gateway.calls().len(), 6);
}

#[tokio::test]
async fn unknown_order_is_neither_written_nor_retried() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default();
    let publisher = RecordingPublisher::default();
    let consumer = consumer(&store, &gateway, &publisher, Default::default());
    let o4 = Uuid::new_v4();

    let report = consumer
        .handle(&InvocationBatch {
            records: vec![created_message("m-4", o4)],
        })
        .await;

    assert_eq!(consumer.respond(&report).status_code, 200);
    assert!(matches!(report.outcomes[0], MessageOutcome::NotFound { .. }));
    assert!(store.writes_for(o4).is_empty());
    assert!(gateway.calls().is_empty());
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn one_bad_message_does_not_block_the_rest() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default().payment_results(&[false, false, false]);
    let publisher = RecordingPublisher::default();
    let failing = store.seed("Dee", "Rug", 1);
    let healthy = store.seed("Eve", "Cup", 6);
    let consumer = consumer(&store, &gateway, &publisher, Default::default());

    let report = consumer
        .handle(&InvocationBatch {
            records: vec![
                QueueRecord::new("junk", "definitely not json"),
                created_message("fails", failing.order_id),
                created_message("missing", Uuid::new_v4()),
                created_message("ok", healthy.order_id),
            ],
        })
        .await;

    assert_eq!(report.outcomes.len(), 4);
    assert!(matches!(report.outcomes[0], MessageOutcome::Skipped { .. }));
    assert!(matches!(report.outcomes[1], MessageOutcome::Failed { .. }));
    assert!(matches!(report.outcomes[2], MessageOutcome::NotFound { .. }));
    assert!(matches!(report.outcomes[3], MessageOutcome::Completed { .. }));
    assert_eq!(store.status_of(healthy.order_id), Some(OrderStatus::Completed));
    assert_eq!(publisher.events().len(), 1);
    assert_eq!(publisher.events()[0].order_id, healthy.order_id);
}

#[tokio::test]
async fn failed_completion_write_falls_back_to_failed() {
    let store = RecordingStore::default();
    store.fail_writes_of(OrderStatus::Completed);
    let gateway = ScriptedGateway::default();
    let publisher = RecordingPublisher::default();
    let order = store.seed("Finn", "Stool", 1);
    let processor = OrderProcessor::new(store.clone(), gateway, publisher.clone());

    let res = processor.process(order.order_id).await;

    assert!(matches!(res, Err(ProcessError::Persistence(_))));
    assert_eq!(
        store.writes_for(order.order_id),
        vec![OrderStatus::Processing, OrderStatus::Failed]
    );
    assert!(publisher.events().is_empty());
}

#[tokio::test]
async fn failed_failure_write_keeps_original_error() {
    let store = RecordingStore::default();
    store.fail_writes_of(OrderStatus::Failed);
    let gateway = ScriptedGateway::default().payment_results(&[false]);
    let order = store.seed("Gus", "Mat", 1);
    let processor = OrderProcessor::new(store.clone(), gateway, RecordingPublisher::default());

    let res = processor.process(order.order_id).await;

    assert!(matches!(res, Err(ProcessError::Fulfillment(_))));
    assert_eq!(store.status_of(order.order_id), Some(OrderStatus::Processing));
}

#[tokio::test]
async fn publish_failure_does_not_undo_completion() {
    let store = RecordingStore::default();
    let order = store.seed("Hal", "Vase", 2);
    let processor = OrderProcessor::new(
        store.clone(),
        ScriptedGateway::default(),
        RecordingPublisher::failing(),
    );

    let report = RetryController::new(policy())
        .run(order.order_id, |_| processor.process(order.order_id))
        .await;

    assert_eq!(report.attempts, 1);
    assert!(report.is_success());
    assert_eq!(store.status_of(order.order_id), Some(OrderStatus::Completed));
}

#[tokio::test]
async fn redelivered_completed_order_is_not_reprocessed() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default();
    let publisher = RecordingPublisher::default();
    let order = store.seed("Ivy", "Bowl", 3);
    let consumer = consumer(&store, &gateway, &publisher, Default::default());

    let batch = InvocationBatch {
        records: vec![
            created_message("first", order.order_id),
            created_message("again", order.order_id),
        ],
    };
    let report = consumer.handle(&batch).await;

    assert!(matches!(report.outcomes[0], MessageOutcome::Completed { .. }));
    assert!(matches!(
        report.outcomes[1],
        MessageOutcome::AlreadyCompleted { .. }
    ));
    assert_eq!(store.writes_for(order.order_id).len(), 2);
    assert_eq!(gateway.calls().len(), 2);
    assert_eq!(publisher.events().len(), 1);
}

#[tokio::test]
async fn exhausted_order_can_publish_failure_and_request_redelivery() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default().payment_results(&[false, false, false]);
    let publisher = RecordingPublisher::default();
    let order = store.seed("Jo", "Pen", 10);
    let options = ConsumerOptions {
        partial_batch_response: true,
        publish_failure_events: true,
    };
    let consumer = consumer(&store, &gateway, &publisher, options);

    let report = consumer
        .handle(&InvocationBatch {
            records: vec![created_message("retry-me", order.order_id)],
        })
        .await;
    let response = consumer.respond(&report);

    assert_eq!(response.status_code, 200);
    assert_eq!(response.batch_item_failures.len(), 1);
    assert_eq!(response.batch_item_failures[0].item_identifier, "retry-me");
    let events = publisher.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].status, OrderStatus::Failed);
    assert_eq!(events[0].quantity, 10);
}

#[tokio::test]
async fn persistence_failure_for_one_order_does_not_block_the_rest() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default();
    let publisher = RecordingPublisher::default();
    let stuck = store.seed("Kai", "Shelf", 1);
    let healthy = store.seed("Lia", "Vase", 2);
    store.fail_writes_for(stuck.order_id, OrderStatus::Processing);
    let consumer = consumer(&store, &gateway, &publisher, Default::default());

    let report = consumer
        .handle(&InvocationBatch {
            records: vec![
                created_message("stuck", stuck.order_id),
                created_message("healthy", healthy.order_id),
            ],
        })
        .await;

    match &report.outcomes[0] {
        MessageOutcome::Failed { attempts, .. } => assert_eq!(*attempts, 3),
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(matches!(report.outcomes[1], MessageOutcome::Completed { .. }));

    // Processing never landed, so no Failed write either.
    assert!(store.writes_for(stuck.order_id).is_empty());
    assert_eq!(store.status_of(stuck.order_id), Some(OrderStatus::Pending));
    assert_eq!(
        store.writes_for(healthy.order_id),
        vec![OrderStatus::Processing, OrderStatus::Completed]
    );
    // The stuck order never reached the gateway.
    assert_eq!(
        gateway.calls(),
        vec![FulfillmentStep::Payment, FulfillmentStep::Inventory]
    );
    assert_eq!(publisher.events().len(), 1);
    assert_eq!(publisher.events()[0].order_id, healthy.order_id);
}

#[tokio::test]
async fn panic_in_one_order_is_contained() {
    let store = RecordingStore::default();
    let publisher = RecordingPublisher::default();
    let crashing = store.seed("Max", "Chair", 1);
    let healthy = store.seed("Nia", "Mug", 4);
    let gateway = ScriptedGateway::default().panic_for(crashing.order_id);
    let options = ConsumerOptions {
        partial_batch_response: true,
        publish_failure_events: false,
    };
    let consumer = consumer(&store, &gateway, &publisher, options);

    let report = consumer
        .handle(&InvocationBatch {
            records: vec![
                created_message("crash", crashing.order_id),
                created_message("fine", healthy.order_id),
            ],
        })
        .await;
    let response = consumer.respond(&report);

    assert!(matches!(
        &report.outcomes[0],
        MessageOutcome::Panicked { order_id, .. } if *order_id == crashing.order_id
    ));
    assert!(matches!(report.outcomes[1], MessageOutcome::Completed { .. }));
    assert_eq!(store.status_of(healthy.order_id), Some(OrderStatus::Completed));

    assert_eq!(response.status_code, 200);
    assert_eq!(response.batch_item_failures.len(), 1);
    assert_eq!(response.batch_item_failures[0].item_identifier, "crash");

    assert!(!consumer.in_flight().is_claimed(crashing.order_id));
    assert!(!consumer.in_flight().is_claimed(healthy.order_id));
}

#[tokio::test]
async fn record_without_body_is_skipped() {
    let store = RecordingStore::default();
    let gateway = ScriptedGateway::default();
    let publisher = RecordingPublisher::default();
    let order = store.seed("Oli", "Clock", 1);
    let consumer = consumer(&store, &gateway, &publisher, Default::default());

    let raw = serde_json::json!({
        "Records": [
            { "messageId": "no-body" },
            { "messageId": "object-body", "body": { "order_id": order.order_id.to_string() } },
            created_message("ok", order.order_id),
        ]
    });
    let batch: InvocationBatch = serde_json::from_value(raw).unwrap();
    let report = consumer.handle(&batch).await;

    assert!(matches!(report.outcomes[0], MessageOutcome::Skipped { .. }));
    assert!(matches!(report.outcomes[1], MessageOutcome::Skipped { .. }));
    assert!(matches!(report.outcomes[2], MessageOutcome::Completed { .. }));
    assert_eq!(store.status_of(order.order_id), Some(OrderStatus::Completed));
}
