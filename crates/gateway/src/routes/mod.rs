pub mod metrics;
pub mod orders;
