use common::ValidationError;
use thiserror::Error;

use crate::OrderId;

/// Errors returned by order ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The request failed revalidation.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// No order exists with the requested id.
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row could not be mapped back into an order.
    #[error("Corrupt order row: {0}")]
    CorruptRow(String),
}

impl LedgerError {
    /// Whether this is a persistence failure rather than a client or lookup outcome.
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            LedgerError::Database(_) | LedgerError::Migration(_) | LedgerError::CorruptRow(_)
        )
    }
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
