pub mod batch_consumer;
pub mod in_flight;
pub mod order_processor;
pub mod retry;
