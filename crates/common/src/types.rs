use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// System-generated identifier of a persisted order.
///
/// Wraps a UUID so order ids cannot be confused with idempotency keys,
/// which are opaque client strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    /// Creates a new random order ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an order ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for OrderId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for OrderId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<OrderId> for Uuid {
    fn from(id: OrderId) -> Self {
        id.0
    }
}

/// Outcome code of a charge decision.
///
/// A decline is a business outcome carried by a successful call, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChargeCode {
    Approved,
    Declined,
}

impl ChargeCode {
    /// Returns the wire representation (`APPROVED` / `DECLINED`).
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargeCode::Approved => "APPROVED",
            ChargeCode::Declined => "DECLINED",
        }
    }

    /// Whether this code represents an approved charge.
    pub fn is_success(&self) -> bool {
        matches!(self, ChargeCode::Approved)
    }
}

impl std::fmt::Display for ChargeCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
