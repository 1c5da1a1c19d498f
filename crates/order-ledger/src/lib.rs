//! Order Ledger: durable, idempotent order persistence.
//!
//! Creation is a single atomic upsert keyed on the client's idempotency key.
//! The storage engine's uniqueness constraint decides which concurrent caller
//! inserts the row; every caller, winner or not, gets the winning row back.
//! No in-process lock is involved, so the guarantee holds across any number
//! of ledger instances sharing one database.

pub mod error;
pub mod memory;
pub mod order;
pub mod postgres;
pub mod store;

pub use common::{OrderId, OrderRequest};
pub use error::{LedgerError, Result};
pub use memory::InMemoryOrderLedger;
pub use order::{CreatedOrder, Order, OrderStatus};
pub use postgres::PostgresOrderLedger;
pub use store::OrderLedger;
