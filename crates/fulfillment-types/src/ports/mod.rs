pub mod fulfillment_gateway;
pub mod notification_publisher;
pub mod status_store;
