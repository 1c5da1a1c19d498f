//! The client order request and its validation gate.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rejection of a malformed order request.
///
/// Validation failures are client-caused: they are surfaced verbatim and
/// never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("user_id is required")]
    MissingUserId,

    #[error("amount_cents must be greater than zero, got {0}")]
    NonPositiveAmount(i64),

    #[error("currency is required")]
    MissingCurrency,

    #[error("idempotency_key is required")]
    MissingIdempotencyKey,
}

/// The four fields a client supplies to create an order.
///
/// Missing JSON fields deserialize to their empty values so that the
/// validation gate, not the decoder, decides what is acceptable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderRequest {
    pub user_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub idempotency_key: String,
}

impl OrderRequest {
    pub fn new(
        user_id: impl Into<String>,
        amount_cents: i64,
        currency: impl Into<String>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            amount_cents,
            currency: currency.into(),
            idempotency_key: idempotency_key.into(),
        }
    }

    /// Checks every field, reporting the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.user_id.is_empty() {
            return Err(ValidationError::MissingUserId);
        }
        if self.amount_cents <= 0 {
            return Err(ValidationError::NonPositiveAmount(self.amount_cents));
        }
        if self.currency.is_empty() {
            return Err(ValidationError::MissingCurrency);
        }
        if self.idempotency_key.is_empty() {
            return Err(ValidationError::MissingIdempotencyKey);
        }
        Ok(())
    }
}
