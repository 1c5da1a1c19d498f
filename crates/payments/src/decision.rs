//! Charge requests and the decisions recorded for them.

use chrono::{DateTime, Utc};
use common::{ChargeCode, OrderId};
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};

/// A request to charge an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeRequest {
    pub order_id: OrderId,
    pub amount_cents: i64,
    pub currency: String,
    pub idempotency_key: String,
}

impl ChargeRequest {
    pub fn new(
        order_id: OrderId,
        amount_cents: i64,
        currency: impl Into<String>,
        idempotency_key: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            amount_cents,
            currency: currency.into(),
            idempotency_key: idempotency_key.into(),
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.idempotency_key.is_empty() {
            return Err(PaymentError::InvalidArgument(
                "idempotency_key is required".to_string(),
            ));
        }
        if self.amount_cents <= 0 {
            return Err(PaymentError::InvalidArgument(format!(
                "amount_cents must be greater than zero, got {}",
                self.amount_cents
            )));
        }
        Ok(())
    }
}

/// The immutable outcome recorded for an idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeDecision {
    pub idempotency_key: String,
    pub success: bool,
    pub code: ChargeCode,
    pub decided_at: DateTime<Utc>,
}

impl ChargeDecision {
    pub(crate) fn new(idempotency_key: impl Into<String>, code: ChargeCode) -> Self {
        Self {
            idempotency_key: idempotency_key.into(),
            success: code.is_success(),
            code,
            decided_at: Utc::now(),
        }
    }
}
