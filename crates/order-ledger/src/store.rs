use async_trait::async_trait;
use common::OrderRequest;

use crate::{CreatedOrder, Order, OrderId, Result};

/// Core trait for order ledger implementations.
///
/// All implementations must be thread-safe (Send + Sync) and must enforce
/// idempotency-key uniqueness inside the storage layer itself.
#[async_trait]
pub trait OrderLedger: Send + Sync {
    /// Creates an order, or returns the existing one for the same key.
    ///
    /// The request is revalidated first; a failure yields
    /// `LedgerError::InvalidArgument` and touches no storage. Otherwise a
    /// single atomic upsert runs: if the key is unseen a new `Created` row is
    /// inserted, if it is already present the insert is a no-op and the
    /// existing row's id and status are returned. Concurrent first callers
    /// for one key all observe the same winning row.
    async fn create_order(&self, request: &OrderRequest) -> Result<CreatedOrder>;

    /// Point lookup by primary id.
    ///
    /// Returns `LedgerError::NotFound` when no row matches, distinct from
    /// any storage failure.
    async fn get_order(&self, id: OrderId) -> Result<Order>;
}
