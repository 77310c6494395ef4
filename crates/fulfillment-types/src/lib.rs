//! fulfillment-types: order model, queue message envelope and the ports the worker drives.

pub mod domain;
pub mod ports;
