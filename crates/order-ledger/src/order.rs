//! The persisted order record.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use common::OrderRequest;
use serde::{Deserialize, Serialize};

use crate::OrderId;

/// Lifecycle status of an order.
///
/// Orders are created in `Created` and not transitioned further by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    Created,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Created => "CREATED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(OrderStatus::Created),
            other => Err(format!("unknown order status {other:?}")),
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: String,
    pub amount_cents: i64,
    pub currency: String,
    pub status: OrderStatus,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Builds a fresh `Created` row for a validated request.
    pub fn from_request(request: &OrderRequest) -> Self {
        Self {
            id: OrderId::new(),
            user_id: request.user_id.clone(),
            amount_cents: request.amount_cents,
            currency: request.currency.clone(),
            status: OrderStatus::Created,
            idempotency_key: request.idempotency_key.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn receipt(&self) -> CreatedOrder {
        CreatedOrder {
            order_id: self.id,
            status: self.status,
        }
    }
}

/// What `create_order` returns: the id and status of the row owning the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
}
