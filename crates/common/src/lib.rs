//! Shared value types for the order/payment workflow.
//!
//! Every service speaks in terms of the same client-supplied idempotency key,
//! order identifier and charge outcome code; they live here so the ledger,
//! the authorizer and the gateway cannot drift apart.

pub mod request;
pub mod types;

pub use request::{OrderRequest, ValidationError};
pub use types::{ChargeCode, OrderId};
