//! fulfillment-worker: queue-driven order fulfillment (retry, state machine, batch handling)

pub mod config;
pub mod errors;

pub mod application;

pub use fulfillment_types::{domain, ports};

pub mod inbound; // invocation boundary (HTTP)
pub mod outbound; // local stand-ins for the gateway and topic
