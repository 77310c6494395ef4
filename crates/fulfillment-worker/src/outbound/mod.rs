pub mod log_publisher;
pub mod simulated_gateway;
