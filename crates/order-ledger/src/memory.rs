use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use async_trait::async_trait;
use common::OrderRequest;
use tokio::sync::RwLock;

use crate::{CreatedOrder, LedgerError, Order, OrderId, OrderLedger, Result};

#[derive(Default)]
struct LedgerTables {
    rows: HashMap<OrderId, Order>,
    // Unique index on idempotency_key.
    by_key: HashMap<String, OrderId>,
}

/// In-memory order ledger for tests and single-process runs.
///
/// Mirrors the PostgreSQL schema: a primary table plus a unique index on the
/// idempotency key. The index and the row are written under the same store
/// write guard, so the upsert is atomic exactly like `ON CONFLICT` is.
#[derive(Clone, Default)]
pub struct InMemoryOrderLedger {
    tables: Arc<RwLock<LedgerTables>>,
}

impl InMemoryOrderLedger {
    /// Creates a new empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of stored orders.
    pub async fn order_count(&self) -> usize {
        self.tables.read().await.rows.len()
    }

    /// Returns how many rows carry the given idempotency key.
    pub async fn rows_for_key(&self, idempotency_key: &str) -> usize {
        self.tables
            .read()
            .await
            .rows
            .values()
            .filter(|order| order.idempotency_key == idempotency_key)
            .count()
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    #[tracing::instrument(skip(self, request), fields(idempotency_key = %request.idempotency_key))]
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder> {
        request.validate()?;

        let mut tables = self.tables.write().await;
        let LedgerTables { rows, by_key } = &mut *tables;

        match by_key.entry(request.idempotency_key.clone()) {
            Entry::Occupied(existing) => {
                let order = rows.get(existing.get()).ok_or_else(|| {
                    LedgerError::CorruptRow(format!(
                        "index entry for key {} points at a missing row",
                        existing.key()
                    ))
                })?;
                tracing::debug!(order_id = %order.id, "idempotency key already present");
                Ok(order.receipt())
            }
            Entry::Vacant(slot) => {
                let order = Order::from_request(request);
                let receipt = order.receipt();
                slot.insert(order.id);
                rows.insert(order.id, order);
                tracing::debug!(order_id = %receipt.order_id, "order inserted");
                Ok(receipt)
            }
        }
    }

    async fn get_order(&self, id: OrderId) -> Result<Order> {
        self.tables
            .read()
            .await
            .rows
            .get(&id)
            .cloned()
            .ok_or(LedgerError::NotFound(id))
    }
}
