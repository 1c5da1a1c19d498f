//! Orchestrator error types.

use common::{OrderId, ValidationError};
use thiserror::Error;

use crate::clients::CallError;

/// Errors that can occur while orchestrating a client request.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request failed validation; no downstream call was made.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The order identifier is empty or malformed.
    #[error("invalid order id: {0:?}")]
    InvalidOrderId(String),

    /// The Order Ledger rejected or failed the create.
    #[error("order creation failed: {0}")]
    OrderCreate(CallError),

    /// The payment hop failed (after retries, for transient failures).
    #[error("payment failed: {0}")]
    Payment(CallError),

    /// No order exists with this id.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The lookup failed for a reason other than not-found.
    #[error("order lookup failed: {0}")]
    Lookup(CallError),
}
